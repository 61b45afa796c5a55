//! Set/get throughput, with a mutex-wrapped HashMap as the baseline.

use std::collections::HashMap;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use parking_lot::Mutex;
use ringcache::Cache;

const PREFILL: u64 = 100_000;

fn cache_set(c: &mut Criterion) {
    let cache = Cache::new(256 * 1024 * 1024);
    let mut i = 0u64;
    c.bench_function("cache_set", |b| {
        b.iter(|| {
            let key = i.to_le_bytes();
            cache.set(black_box(&key), &[0u8; 8], 0).unwrap();
            i = i.wrapping_add(1);
        })
    });
}

fn cache_get(c: &mut Criterion) {
    let cache = Cache::new(256 * 1024 * 1024);
    for i in 0..PREFILL {
        cache.set(&i.to_le_bytes(), &[0u8; 8], 0).unwrap();
    }
    let mut i = 0u64;
    c.bench_function("cache_get", |b| {
        b.iter(|| {
            let key = (i % PREFILL).to_le_bytes();
            black_box(cache.get(black_box(&key)).ok());
            i = i.wrapping_add(1);
        })
    });
}

fn map_set(c: &mut Criterion) {
    let map: Mutex<HashMap<Vec<u8>, Vec<u8>>> = Mutex::new(HashMap::new());
    let mut i = 0u64;
    c.bench_function("map_set", |b| {
        b.iter(|| {
            let key = i.to_le_bytes().to_vec();
            map.lock().insert(black_box(key), vec![0u8; 8]);
            i = i.wrapping_add(1);
        })
    });
}

fn map_get(c: &mut Criterion) {
    let map: Mutex<HashMap<Vec<u8>, Vec<u8>>> = Mutex::new(HashMap::new());
    for i in 0..PREFILL {
        map.lock().insert(i.to_le_bytes().to_vec(), vec![0u8; 8]);
    }
    let mut i = 0u64;
    c.bench_function("map_get", |b| {
        b.iter(|| {
            let key = (i % PREFILL).to_le_bytes();
            black_box(map.lock().get(key.as_slice()).cloned());
            i = i.wrapping_add(1);
        })
    });
}

criterion_group!(benches, cache_set, cache_get, map_set, map_get);
criterion_main!(benches);
