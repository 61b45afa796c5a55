//! Per-segment index: 256 slot groups, each a vector of entry records
//! sorted ascending by `hash16`.
//!
//! Small sorted vectors beat a nested hash map here. Groups stay short in
//! expectation, binary search is cache-friendly, and inserts shift a
//! handful of 16-byte records.

use crate::entry::EntryPtr;

/// Number of slot groups per segment. The middle byte of the key hash
/// selects one.
pub(crate) const SLOT_COUNT: usize = 256;

pub(crate) struct SlotTable {
    groups: Vec<Vec<EntryPtr>>,
}

impl SlotTable {
    pub fn new() -> Self {
        SlotTable {
            groups: (0..SLOT_COUNT).map(|_| Vec::new()).collect(),
        }
    }

    #[inline]
    pub fn group(&self, slot_id: u8) -> &[EntryPtr] {
        &self.groups[slot_id as usize]
    }

    /// First index in the group whose record sorts at or after `hash16`.
    pub fn lower_bound(&self, slot_id: u8, hash16: u16) -> usize {
        self.groups[slot_id as usize].partition_point(|p| p.hash16 < hash16)
    }

    /// Insert at `idx`, which the caller obtained from `lower_bound` so the
    /// group stays sorted.
    pub fn insert(&mut self, slot_id: u8, idx: usize, ptr: EntryPtr) {
        let group = &mut self.groups[slot_id as usize];
        debug_assert!(idx <= group.len());
        group.insert(idx, ptr);
    }

    pub fn remove(&mut self, slot_id: u8, idx: usize) -> EntryPtr {
        self.groups[slot_id as usize].remove(idx)
    }

    pub fn get_mut(&mut self, slot_id: u8, idx: usize) -> &mut EntryPtr {
        &mut self.groups[slot_id as usize][idx]
    }

    /// Find the record with this tag and buffer offset. Used by eviction,
    /// which knows the stored header but not the group index.
    pub fn find_by_offset(&self, slot_id: u8, hash16: u16, offset: u64) -> Option<usize> {
        let group = &self.groups[slot_id as usize];
        let mut idx = group.partition_point(|p| p.hash16 < hash16);
        while idx < group.len() && group[idx].hash16 == hash16 {
            if group[idx].offset == offset {
                return Some(idx);
            }
            idx += 1;
        }
        None
    }

    /// Total records across all groups.
    pub fn len(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        for group in &mut self.groups {
            group.clear();
        }
    }
}
