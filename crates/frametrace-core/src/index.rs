//! Sequential index log entries.
//!
//! The index is a flat append log of `(record_number, offset)` pairs, one per
//! data record, in write order. There is no tree structure behind it.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

/// Location of one data record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Sequence number of the record (0 = begin-frame).
    pub record_number: i32,
    /// Byte offset in the data file where the record starts.
    pub offset: i64,
}

impl IndexEntry {
    /// Encoded size: `i32` LE record number followed by `i64` LE offset.
    pub const SIZE: usize = 12;

    /// Construct an entry.
    #[inline]
    #[must_use]
    pub const fn new(record_number: i32, offset: i64) -> Self {
        Self { record_number, offset }
    }

    /// Wire bytes of this entry.
    #[must_use]
    pub fn to_le_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..4].copy_from_slice(&self.record_number.to_le_bytes());
        out[4..].copy_from_slice(&self.offset.to_le_bytes());
        out
    }

    /// Append the entry to `w` in a single `write_all`.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_i32_then_i64_little_endian() {
        let e = IndexEntry::new(2, 192);
        let b = e.to_le_bytes();
        assert_eq!(&b[..4], &[2, 0, 0, 0]);
        assert_eq!(&b[4..], &[192, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn negative_values_keep_twos_complement() {
        let b = IndexEntry::new(-1, -2).to_le_bytes();
        assert_eq!(&b[..4], &[0xff; 4]);
        assert_eq!(b[4], 0xfe);
        assert!(b[5..].iter().all(|&x| x == 0xff));
    }
}
