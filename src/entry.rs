//! Inline entry layout.
//!
//! Every entry in a segment's ring buffer is a fixed 24-byte header
//! followed by `key_len` key bytes and `val_cap` value bytes, of which the
//! first `val_len` are meaningful. Fields use fixed-size little-endian
//! encoding so an entry read back from any offset decodes identically.

/// Size in bytes of the header preceding every stored entry.
///
/// The largest storable value for a key is
/// `segment_buffer_size / 4 - ENTRY_HDR_SIZE - key_len`.
pub const ENTRY_HDR_SIZE: usize = 24;

/// Longest accepted key. Key lengths are stored in a 16-bit field.
pub const MAX_KEY_LEN: usize = 65535;

/// Decoded form of the inline header.
///
/// Layout: `access_time` u32 at 0, `expire_at` u32 at 4, `key_len` u16 at
/// 8, `hash16` u16 at 10, `val_len` u32 at 12, `val_cap` u32 at 16,
/// `deleted` u8 at 20, `slot_id` u8 at 21, two reserved bytes at 22.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct EntryHeader {
    /// Second the entry was last written or read.
    pub access_time: u32,
    /// Expiry second, 0 = never.
    pub expire_at: u32,
    pub key_len: u16,
    /// High 16 bits of the key hash.
    pub hash16: u16,
    pub val_len: u32,
    /// Reserved value capacity, always >= `val_len`.
    pub val_cap: u32,
    pub deleted: bool,
    /// Low byte of `hash >> 8`; selects the slot group.
    pub slot_id: u8,
}

impl EntryHeader {
    pub fn encode(&self) -> [u8; ENTRY_HDR_SIZE] {
        let mut buf = [0u8; ENTRY_HDR_SIZE];
        buf[0..4].copy_from_slice(&self.access_time.to_le_bytes());
        buf[4..8].copy_from_slice(&self.expire_at.to_le_bytes());
        buf[8..10].copy_from_slice(&self.key_len.to_le_bytes());
        buf[10..12].copy_from_slice(&self.hash16.to_le_bytes());
        buf[12..16].copy_from_slice(&self.val_len.to_le_bytes());
        buf[16..20].copy_from_slice(&self.val_cap.to_le_bytes());
        buf[20] = self.deleted as u8;
        buf[21] = self.slot_id;
        buf
    }

    pub fn decode(buf: &[u8; ENTRY_HDR_SIZE]) -> Self {
        EntryHeader {
            access_time: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            expire_at: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            key_len: u16::from_le_bytes([buf[8], buf[9]]),
            hash16: u16::from_le_bytes([buf[10], buf[11]]),
            val_len: u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
            val_cap: u32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]),
            deleted: buf[20] != 0,
            slot_id: buf[21],
        }
    }

    /// Total bytes the entry occupies in the ring buffer.
    #[inline]
    pub fn entry_len(&self) -> u64 {
        (ENTRY_HDR_SIZE + self.key_len as usize + self.val_cap as usize) as u64
    }
}

/// Index record pointing at an inline entry. Lives in a slot group, sorted
/// by `hash16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EntryPtr {
    /// Logical ring-buffer offset of the entry header.
    pub offset: u64,
    /// High 16 bits of the key hash; the group sort key.
    pub hash16: u16,
    /// Expiry second mirrored from the header, 0 = never.
    pub expire_at: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let hdr = EntryHeader {
            access_time: 1_700_000_001,
            expire_at: 1_700_000_031,
            key_len: 12,
            hash16: 0xA5C3,
            val_len: 100,
            val_cap: 128,
            deleted: true,
            slot_id: 7,
        };
        assert_eq!(EntryHeader::decode(&hdr.encode()), hdr);
    }

    #[test]
    fn field_offsets_match_layout() {
        let hdr = EntryHeader {
            access_time: 0x0403_0201,
            expire_at: 0x0807_0605,
            key_len: 0x0A09,
            hash16: 0x0C0B,
            val_len: 0x100F_0E0D,
            val_cap: 0x1413_1211,
            deleted: false,
            slot_id: 0x15,
        };
        let buf = hdr.encode();
        assert_eq!(
            buf,
            [
                0x01, 0x02, 0x03, 0x04, // access_time
                0x05, 0x06, 0x07, 0x08, // expire_at
                0x09, 0x0A, // key_len
                0x0B, 0x0C, // hash16
                0x0D, 0x0E, 0x0F, 0x10, // val_len
                0x11, 0x12, 0x13, 0x14, // val_cap
                0x00, 0x15, // deleted, slot_id
                0x00, 0x00, // reserved
            ]
        );
    }

    #[test]
    fn entry_len_includes_header_key_and_capacity() {
        let hdr = EntryHeader {
            key_len: 4,
            val_len: 8,
            val_cap: 16,
            ..Default::default()
        };
        assert_eq!(hdr.entry_len(), (ENTRY_HDR_SIZE + 4 + 16) as u64);
    }
}
