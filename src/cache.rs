//! The public cache: 256 mutex-striped segments.

use parking_lot::Mutex;
use tracing::debug;

use crate::clock::Clock;
use crate::error::CacheError;
use crate::hash::{hash64, segment_of};
use crate::segment::{Segment, MIN_SEGMENT_SIZE};

/// Number of independently locked segments. The low byte of the key hash
/// selects one.
pub const SEGMENT_COUNT: usize = 256;

/// Fixed-capacity cache for byte keys and byte values.
///
/// Entries live inline in per-segment ring buffers. Reads and writes on
/// different segments proceed in parallel; operations on the same key are
/// linearized by the owning segment's mutex. See the crate docs for usage.
pub struct Cache {
    segments: Box<[Mutex<Segment>]>,
    clock: Clock,
}

impl Cache {
    /// Create a cache holding roughly `capacity` bytes of entry data.
    ///
    /// The capacity is split evenly across 256 segments, each rounded up
    /// to a power-of-two buffer of at least
    /// [`MIN_SEGMENT_SIZE`](crate::MIN_SEGMENT_SIZE) bytes, so the smallest
    /// effective capacity is 128 KiB.
    pub fn new(capacity: usize) -> Self {
        let seg_size = (capacity / SEGMENT_COUNT)
            .next_power_of_two()
            .max(MIN_SEGMENT_SIZE);
        let segments: Box<[Mutex<Segment>]> = (0..SEGMENT_COUNT)
            .map(|_| Mutex::new(Segment::new(seg_size)))
            .collect();
        debug!(capacity, segment_size = seg_size, "cache created");
        Cache {
            segments,
            clock: Clock::new(),
        }
    }

    #[inline]
    fn segment(&self, hash: u64) -> &Mutex<Segment> {
        &self.segments[segment_of(hash)]
    }

    /// Store `value` under `key`.
    ///
    /// `expire_seconds == 0` stores the entry without an expiry. Size
    /// validation happens before any state changes, so a rejected set
    /// leaves the cache untouched.
    pub fn set(&self, key: &[u8], value: &[u8], expire_seconds: u32) -> Result<(), CacheError> {
        let hash = hash64(key);
        let now = self.clock.now();
        self.segment(hash)
            .lock()
            .set(key, value, hash, expire_seconds, now)
    }

    /// Fetch an owned copy of the value stored under `key`, refreshing its
    /// access time.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>, CacheError> {
        let hash = hash64(key);
        let now = self.clock.now();
        self.segment(hash).lock().get(key, hash, now, false)
    }

    /// Like [`get`](Cache::get), but without updating the entry's access
    /// time or the hit/miss counters.
    pub fn peek(&self, key: &[u8]) -> Result<Vec<u8>, CacheError> {
        let hash = hash64(key);
        let now = self.clock.now();
        self.segment(hash).lock().get(key, hash, now, true)
    }

    /// Remove the entry stored under `key`. Returns true iff a get
    /// immediately before would have returned a value.
    pub fn del(&self, key: &[u8]) -> bool {
        let hash = hash64(key);
        let now = self.clock.now();
        self.segment(hash).lock().del(key, hash, now)
    }

    /// Seconds until the entry under `key` expires; 0 for entries without
    /// an expiry.
    pub fn ttl(&self, key: &[u8]) -> Result<u32, CacheError> {
        let hash = hash64(key);
        let now = self.clock.now();
        self.segment(hash).lock().ttl(key, hash, now)
    }

    /// Replace the expiry of the entry under `key` without rewriting its
    /// value.
    pub fn touch(&self, key: &[u8], expire_seconds: u32) -> Result<(), CacheError> {
        let hash = hash64(key);
        let now = self.clock.now();
        self.segment(hash)
            .lock()
            .touch(key, hash, expire_seconds, now)
    }

    /// Drop every entry and zero every counter.
    pub fn clear(&self) {
        for segment in self.segments.iter() {
            segment.lock().clear();
        }
        debug!("cache cleared");
    }

    /// Zero the statistical counters, keeping all entries.
    pub fn reset_statistics(&self) {
        for segment in self.segments.iter() {
            segment.lock().reset_statistics();
        }
    }

    // --- Statistics ---

    /// Number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.segments.iter().map(|s| s.lock().entry_count).sum()
    }

    pub fn hit_count(&self) -> u64 {
        self.segments.iter().map(|s| s.lock().hit_count).sum()
    }

    pub fn miss_count(&self) -> u64 {
        self.segments.iter().map(|s| s.lock().miss_count).sum()
    }

    /// Total lookups observed by get, hits and misses together.
    pub fn lookup_count(&self) -> u64 {
        self.segments
            .iter()
            .map(|s| {
                let seg = s.lock();
                seg.hit_count + seg.miss_count
            })
            .sum()
    }

    /// Fraction of lookups that hit, 0.0 when nothing was looked up yet.
    pub fn hit_rate(&self) -> f64 {
        let (mut hits, mut lookups) = (0u64, 0u64);
        for segment in self.segments.iter() {
            let seg = segment.lock();
            hits += seg.hit_count;
            lookups += seg.hit_count + seg.miss_count;
        }
        if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        }
    }

    /// Entries removed or relocated to make room for new writes.
    pub fn evacuate_count(&self) -> u64 {
        self.segments.iter().map(|s| s.lock().total_evacuate).sum()
    }

    /// Entries collected because their expiry passed.
    pub fn expired_count(&self) -> u64 {
        self.segments.iter().map(|s| s.lock().total_expired).sum()
    }

    /// Sets that rewrote a value in place.
    pub fn overwrite_count(&self) -> u64 {
        self.segments.iter().map(|s| s.lock().overwrites).sum()
    }

    /// Successful expiry updates via [`touch`](Cache::touch).
    pub fn touched_count(&self) -> u64 {
        self.segments.iter().map(|s| s.lock().touched).sum()
    }

    /// Index records observed disagreeing with their stored header. Always
    /// 0 unless the engine has a bug.
    pub fn corruption_count(&self) -> u64 {
        self.segments.iter().map(|s| s.lock().corruptions).sum()
    }

    /// Mean access second over resident entries, 0 when the cache holds
    /// nothing.
    pub fn average_access_time(&self) -> u64 {
        let (mut time, mut count) = (0u64, 0u64);
        for segment in self.segments.iter() {
            let seg = segment.lock();
            time += seg.total_time;
            count += seg.total_count;
        }
        if count == 0 {
            0
        } else {
            time / count
        }
    }
}
