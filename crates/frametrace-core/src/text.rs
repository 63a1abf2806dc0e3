//! Fixed-width, space-padded text fields.
//!
//! Every text slot in a record is exactly [`FIELD_LEN`] bytes: the source
//! string is copied left-aligned and the remainder is filled with ASCII
//! spaces. Longer inputs are cut at byte [`FIELD_LEN`] by [`FixedText::new`];
//! [`FixedText::try_new`] refuses them instead.

use std::fmt;

use crate::error::{Result, TraceError};

/// Width in bytes of every text field on the wire.
pub const FIELD_LEN: usize = 32;

/// Padding byte used to fill short fields.
pub const PAD_BYTE: u8 = b' ';

/// A single 32-byte text field as it appears on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedText([u8; FIELD_LEN]);

impl FixedText {
    /// Left-align `s` and pad with spaces; silently drops bytes past [`FIELD_LEN`].
    ///
    /// Truncation is byte-wise, so a multi-byte UTF-8 character straddling the
    /// boundary is split.
    #[must_use]
    pub fn new(s: &str) -> Self {
        let src = s.as_bytes();
        if src.len() > FIELD_LEN {
            tracing::debug!(len = src.len(), max = FIELD_LEN, "truncating text field");
        }
        Self::from_prefix(src)
    }

    /// Like [`FixedText::new`] but rejects inputs longer than [`FIELD_LEN`].
    pub fn try_new(s: &str) -> Result<Self> {
        let len = s.len();
        if len > FIELD_LEN {
            return Err(TraceError::FieldTooLong { len, max: FIELD_LEN });
        }
        Ok(Self::from_prefix(s.as_bytes()))
    }

    fn from_prefix(src: &[u8]) -> Self {
        let mut buf = [PAD_BYTE; FIELD_LEN];
        let n = src.len().min(FIELD_LEN);
        buf[..n].copy_from_slice(&src[..n]);
        Self(buf)
    }

    /// Wrap raw field bytes exactly as they were stored.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; FIELD_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw field bytes, padding included.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; FIELD_LEN] {
        &self.0
    }

    /// Field content with trailing padding removed.
    #[must_use]
    pub fn trimmed(&self) -> &[u8] {
        let end = self
            .0
            .iter()
            .rposition(|&b| b != PAD_BYTE)
            .map_or(0, |i| i + 1);
        &self.0[..end]
    }

    /// Trimmed content as UTF-8, lossily.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.trimmed()).into_owned()
    }
}

impl Default for FixedText {
    fn default() -> Self {
        Self([PAD_BYTE; FIELD_LEN])
    }
}

impl From<&str> for FixedText {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for FixedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedText({:?})", self.to_string_lossy())
    }
}

impl fmt::Display for FixedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_space_padded() {
        let t = FixedText::new("getBytes");
        assert_eq!(&t.as_bytes()[..8], b"getBytes");
        assert!(t.as_bytes()[8..].iter().all(|&b| b == b' '));
        assert_eq!(t.trimmed(), b"getBytes");
    }

    #[test]
    fn long_input_is_cut_at_field_width() {
        let s = "a".repeat(40);
        let t = FixedText::new(&s);
        assert_eq!(t.trimmed(), "a".repeat(32).as_bytes());
    }

    #[test]
    fn strict_rejects_long_input() {
        let s = "x".repeat(33);
        match FixedText::try_new(&s) {
            Err(TraceError::FieldTooLong { len, max }) => {
                assert_eq!(len, 33);
                assert_eq!(max, FIELD_LEN);
            }
            other => panic!("expected FieldTooLong, got {other:?}"),
        }
        assert!(FixedText::try_new(&"x".repeat(32)).is_ok());
    }

    #[test]
    fn empty_input_is_all_padding() {
        let t = FixedText::new("");
        assert_eq!(t, FixedText::default());
        assert!(t.trimmed().is_empty());
    }
}
