//! Fixed-capacity in-process cache for byte keys and byte values.
//!
//! Entries are stored inline in 256 per-segment ring buffers behind
//! striped mutexes. The write path performs no per-entry heap allocation,
//! eviction is approximate LRU driven by the ring's tail, and each entry
//! may carry its own time-to-live. Millions of small entries fit in a
//! handful of fixed allocations, so the cache puts no pressure on the
//! allocator as it churns.
//!
//! # Examples
//!
//! ```
//! use ringcache::Cache;
//!
//! let cache = Cache::new(16 * 1024 * 1024);
//! cache.set(b"user:42", b"tessa", 0).unwrap();
//! assert_eq!(cache.get(b"user:42").unwrap(), b"tessa");
//!
//! // Entries may expire on their own.
//! cache.set(b"session:9", b"token", 30).unwrap();
//! assert_eq!(cache.ttl(b"session:9").unwrap(), 30);
//!
//! assert!(cache.del(b"user:42"));
//! assert!(cache.get(b"user:42").is_err());
//! ```
//!
//! The cache is safe to share across threads:
//!
//! ```
//! use ringcache::Cache;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let cache = Arc::new(Cache::new(16 * 1024 * 1024));
//! let writer = Arc::clone(&cache);
//! let handle = thread::spawn(move || {
//!     writer.set(b"from-thread", b"1", 0).unwrap();
//! });
//! handle.join().unwrap();
//! assert_eq!(cache.get(b"from-thread").unwrap(), b"1");
//! ```

mod cache;
mod clock;
mod entry;
mod error;
mod hash;
mod ring;
mod segment;
mod slot;

#[cfg(test)]
mod property_tests;

pub use cache::{Cache, SEGMENT_COUNT};
pub use entry::{ENTRY_HDR_SIZE, MAX_KEY_LEN};
pub use error::CacheError;
pub use segment::MIN_SEGMENT_SIZE;
