//! One cache shard: a ring buffer, the slot index over it, and counters.
//!
//! A segment is single-threaded by construction. The cache wraps each one
//! in a mutex and every method here runs with the lock held, so plain
//! fields are enough for all bookkeeping.

use crate::entry::{EntryHeader, EntryPtr, ENTRY_HDR_SIZE, MAX_KEY_LEN};
use crate::error::CacheError;
use crate::hash::{slot_of, tag_of};
use crate::ring::RingBuf;
use crate::slot::SlotTable;

/// Smallest ring buffer a segment will run with.
pub const MIN_SEGMENT_SIZE: usize = 512;

/// How many entries in a row may be relocated before eviction becomes
/// unconditional, bounding the work of a single reclaim pass.
const MAX_CONSECUTIVE_RELOCATIONS: u32 = 5;

pub(crate) struct Segment {
    rb: RingBuf,
    slots: SlotTable,
    /// Free bytes between the write head and the oldest retained entry.
    vacuum_len: u64,

    /// Records in the slot table, i.e. live indexed entries.
    pub(crate) entry_count: u64,
    /// Headers resident in the buffer, including deleted ones not yet
    /// consumed by eviction.
    pub(crate) total_count: u64,
    /// Sum of `access_time` over resident headers.
    pub(crate) total_time: u64,
    pub(crate) hit_count: u64,
    pub(crate) miss_count: u64,
    pub(crate) total_evacuate: u64,
    pub(crate) total_expired: u64,
    pub(crate) overwrites: u64,
    pub(crate) touched: u64,
    /// Index records found disagreeing with their stored header.
    pub(crate) corruptions: u64,
}

impl Segment {
    pub fn new(buf_size: usize) -> Self {
        debug_assert!(buf_size >= MIN_SEGMENT_SIZE && buf_size.is_power_of_two());
        Segment {
            rb: RingBuf::new(buf_size),
            slots: SlotTable::new(),
            vacuum_len: buf_size as u64,
            entry_count: 0,
            total_count: 0,
            total_time: 0,
            hit_count: 0,
            miss_count: 0,
            total_evacuate: 0,
            total_expired: 0,
            overwrites: 0,
            touched: 0,
            corruptions: 0,
        }
    }

    /// Largest combined key + value length this segment accepts.
    #[inline]
    fn max_key_val_len(&self) -> usize {
        self.rb.size() / 4 - ENTRY_HDR_SIZE
    }

    fn read_header(&self, off: u64) -> EntryHeader {
        let mut buf = [0u8; ENTRY_HDR_SIZE];
        self.rb.read_at(&mut buf, off);
        EntryHeader::decode(&buf)
    }

    fn write_header(&mut self, hdr: &EntryHeader, off: u64) {
        self.rb.write_at(&hdr.encode(), off);
    }

    /// Find the live entry for `key`: binary-search the group for the tag,
    /// then walk the equal-tag run comparing stored key bytes.
    ///
    /// A record whose stored header disagrees on tag or group is treated as
    /// not found in release builds and counted.
    fn lookup(&mut self, slot_id: u8, hash16: u16, key: &[u8]) -> Option<(usize, EntryHeader)> {
        let mut idx = self.slots.lower_bound(slot_id, hash16);
        loop {
            let ptr = match self.slots.group(slot_id).get(idx) {
                Some(p) if p.hash16 == hash16 => *p,
                _ => return None,
            };
            let hdr = self.read_header(ptr.offset);
            if hdr.deleted || hdr.hash16 != ptr.hash16 || hdr.slot_id != slot_id {
                debug_assert!(false, "slot record does not match stored header");
                self.corruptions += 1;
                idx += 1;
                continue;
            }
            if hdr.key_len as usize == key.len()
                && self.rb.equal_at(key, ptr.offset + ENTRY_HDR_SIZE as u64)
            {
                return Some((idx, hdr));
            }
            idx += 1;
        }
    }

    pub fn set(
        &mut self,
        key: &[u8],
        value: &[u8],
        hash: u64,
        expire_seconds: u32,
        now: u32,
    ) -> Result<(), CacheError> {
        if key.len() > MAX_KEY_LEN {
            return Err(CacheError::LargeKey);
        }
        let max_kv = self.max_key_val_len();
        if key.len() + value.len() > max_kv {
            return Err(CacheError::LargeEntry);
        }

        let expire_at = if expire_seconds == 0 {
            0
        } else {
            now.saturating_add(expire_seconds)
        };
        let slot_id = slot_of(hash);
        let hash16 = tag_of(hash);

        let mut hdr = EntryHeader {
            access_time: now,
            expire_at,
            key_len: key.len() as u16,
            hash16,
            val_len: value.len() as u32,
            val_cap: value.len().max(1) as u32,
            deleted: false,
            slot_id,
        };

        if let Some((idx, old)) = self.lookup(slot_id, hash16, key) {
            let offset = self.slots.group(slot_id)[idx].offset;
            if old.val_cap >= hdr.val_len {
                // The new value fits the reserved capacity: overwrite in
                // place. The entry keeps its position in the ring.
                hdr.val_cap = old.val_cap;
                self.total_time += u64::from(now) - u64::from(old.access_time);
                self.write_header(&hdr, offset);
                self.rb
                    .write_at(value, offset + (ENTRY_HDR_SIZE + key.len()) as u64);
                self.slots.get_mut(slot_id, idx).expire_at = expire_at;
                self.overwrites += 1;
                return Ok(());
            }
            // Outgrew the reservation: retire the old entry and append a
            // grown copy. Capacity doubles from the old reservation so a
            // steadily growing value settles into the overwrite path.
            self.del_entry_ptr(slot_id, idx);
            let mut cap = u64::from(old.val_cap);
            while cap < u64::from(hdr.val_len) {
                cap *= 2;
            }
            hdr.val_cap = cap.min((max_kv - key.len()) as u64) as u32;
        }

        let entry_len = hdr.entry_len();
        self.evacuate(entry_len, now);

        // Eviction may have reshuffled the group, so the insert position is
        // computed only now.
        let new_off = self.rb.end();
        let idx = self.slots.lower_bound(slot_id, hash16);
        self.slots.insert(
            slot_id,
            idx,
            EntryPtr {
                offset: new_off,
                hash16,
                expire_at,
            },
        );
        self.entry_count += 1;

        self.rb.push(&hdr.encode());
        self.rb.push(key);
        self.rb.push(value);
        self.rb.skip(u64::from(hdr.val_cap - hdr.val_len));

        self.total_time += u64::from(now);
        self.total_count += 1;
        self.vacuum_len -= entry_len;
        Ok(())
    }

    /// Reclaim ring-buffer space until `entry_len` bytes are free ahead of
    /// the write head.
    ///
    /// Walks the oldest resident headers. Dead and expired entries are
    /// consumed outright. A live entry accessed more recently than the
    /// segment's rolling mean is relocated to the head instead of dropped,
    /// up to a bounded streak.
    fn evacuate(&mut self, entry_len: u64, now: u32) {
        let mut consecutive_relocations = 0u32;
        while self.vacuum_len < entry_len {
            let old_off = self.rb.end() + self.vacuum_len - self.rb.size() as u64;
            let old = self.read_header(old_off);
            let old_len = old.entry_len();

            if old.deleted {
                consecutive_relocations = 0;
                self.total_time -= u64::from(old.access_time);
                self.total_count -= 1;
                self.vacuum_len += old_len;
                continue;
            }

            let expired = old.expire_at != 0 && old.expire_at <= now;
            let least_recent =
                u64::from(old.access_time) * self.total_count <= self.total_time;
            if expired || least_recent || consecutive_relocations > MAX_CONSECUTIVE_RELOCATIONS {
                self.del_entry_ptr_by_offset(old.slot_id, old.hash16, old_off);
                consecutive_relocations = 0;
                self.total_time -= u64::from(old.access_time);
                self.total_count -= 1;
                self.vacuum_len += old_len;
                if expired {
                    self.total_expired += 1;
                } else {
                    self.total_evacuate += 1;
                }
            } else {
                // Accessed recently: keep it by moving its bytes to the
                // head and repointing the record.
                let new_off = self.rb.relocate(old_off, old_len as usize);
                self.update_entry_ptr(old.slot_id, old.hash16, old_off, new_off);
                consecutive_relocations += 1;
                self.total_evacuate += 1;
            }
        }
    }

    pub fn get(
        &mut self,
        key: &[u8],
        hash: u64,
        now: u32,
        peek: bool,
    ) -> Result<Vec<u8>, CacheError> {
        let slot_id = slot_of(hash);
        let hash16 = tag_of(hash);
        let Some((idx, mut hdr)) = self.lookup(slot_id, hash16, key) else {
            if !peek {
                self.miss_count += 1;
            }
            return Err(CacheError::NotFound);
        };
        let offset = self.slots.group(slot_id)[idx].offset;

        if hdr.expire_at != 0 && hdr.expire_at <= now {
            if !peek {
                self.del_entry_ptr(slot_id, idx);
                self.total_expired += 1;
                self.miss_count += 1;
            }
            return Err(CacheError::NotFound);
        }

        let mut value = vec![0u8; hdr.val_len as usize];
        self.rb
            .read_at(&mut value, offset + (ENTRY_HDR_SIZE + hdr.key_len as usize) as u64);

        if !peek {
            self.total_time += u64::from(now - hdr.access_time);
            hdr.access_time = now;
            self.write_header(&hdr, offset);
            self.hit_count += 1;
        }
        Ok(value)
    }

    /// Remove the entry for `key`. True only when a live, unexpired entry
    /// was removed; an expired entry is accounted as an expiry instead.
    pub fn del(&mut self, key: &[u8], hash: u64, now: u32) -> bool {
        let slot_id = slot_of(hash);
        let hash16 = tag_of(hash);
        match self.lookup(slot_id, hash16, key) {
            Some((idx, hdr)) => {
                self.del_entry_ptr(slot_id, idx);
                if hdr.expire_at != 0 && hdr.expire_at <= now {
                    self.total_expired += 1;
                    false
                } else {
                    true
                }
            }
            None => false,
        }
    }

    /// Seconds until the entry expires. 0 means the entry never expires.
    /// Expired entries report not-found but are left for eviction to
    /// collect.
    pub fn ttl(&mut self, key: &[u8], hash: u64, now: u32) -> Result<u32, CacheError> {
        let slot_id = slot_of(hash);
        let hash16 = tag_of(hash);
        let Some((idx, _)) = self.lookup(slot_id, hash16, key) else {
            return Err(CacheError::NotFound);
        };
        // The record mirrors the header's expiry, saving a second buffer
        // read.
        match self.slots.group(slot_id)[idx].expire_at {
            0 => Ok(0),
            expire_at if expire_at > now => Ok(expire_at - now),
            _ => Err(CacheError::NotFound),
        }
    }

    /// Replace the entry's expiry without touching its value or access
    /// time.
    pub fn touch(
        &mut self,
        key: &[u8],
        hash: u64,
        expire_seconds: u32,
        now: u32,
    ) -> Result<(), CacheError> {
        let slot_id = slot_of(hash);
        let hash16 = tag_of(hash);
        let Some((idx, mut hdr)) = self.lookup(slot_id, hash16, key) else {
            return Err(CacheError::NotFound);
        };
        if hdr.expire_at != 0 && hdr.expire_at <= now {
            self.del_entry_ptr(slot_id, idx);
            self.total_expired += 1;
            return Err(CacheError::NotFound);
        }
        let offset = self.slots.group(slot_id)[idx].offset;
        hdr.expire_at = if expire_seconds == 0 {
            0
        } else {
            now.saturating_add(expire_seconds)
        };
        self.write_header(&hdr, offset);
        self.slots.get_mut(slot_id, idx).expire_at = hdr.expire_at;
        self.touched += 1;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.rb.reset();
        self.slots.clear();
        self.vacuum_len = self.rb.size() as u64;
        self.entry_count = 0;
        self.total_count = 0;
        self.total_time = 0;
        self.reset_statistics();
        self.corruptions = 0;
    }

    /// Zero the statistical counters while leaving entries intact.
    pub fn reset_statistics(&mut self) {
        self.hit_count = 0;
        self.miss_count = 0;
        self.total_evacuate = 0;
        self.total_expired = 0;
        self.overwrites = 0;
        self.touched = 0;
    }

    /// Remove the record at `idx` and mark its stored header dead so
    /// eviction can consume the bytes without consulting the index.
    fn del_entry_ptr(&mut self, slot_id: u8, idx: usize) {
        let ptr = self.slots.remove(slot_id, idx);
        let mut hdr = self.read_header(ptr.offset);
        hdr.deleted = true;
        self.write_header(&hdr, ptr.offset);
        self.entry_count -= 1;
    }

    /// Remove the record for the entry at `offset`. The stored header is
    /// left alone; its bytes are about to be consumed by eviction.
    fn del_entry_ptr_by_offset(&mut self, slot_id: u8, hash16: u16, offset: u64) {
        match self.slots.find_by_offset(slot_id, hash16, offset) {
            Some(idx) => {
                self.slots.remove(slot_id, idx);
                self.entry_count -= 1;
            }
            None => {
                debug_assert!(false, "evicted header has no slot record");
                self.corruptions += 1;
            }
        }
    }

    fn update_entry_ptr(&mut self, slot_id: u8, hash16: u16, old_off: u64, new_off: u64) {
        match self.slots.find_by_offset(slot_id, hash16, old_off) {
            Some(idx) => self.slots.get_mut(slot_id, idx).offset = new_off,
            None => {
                debug_assert!(false, "relocated header has no slot record");
                self.corruptions += 1;
            }
        }
    }

    #[cfg(test)]
    fn indexed_records(&self) -> usize {
        self.slots.len()
    }
}
