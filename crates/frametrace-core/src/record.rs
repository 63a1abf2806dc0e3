//! Record codec: the three fixed-size record shapes and their byte layout.
//!
//! Layout shared by every record:
//!
//! | offset | len | content                       |
//! |--------|-----|-------------------------------|
//! | 0      | 1   | tag (`B`, `E`, or `I`)        |
//! | 1      | 15  | padding (written as zero)     |
//! | 16     | 32n | `n` fixed-width text fields   |
//!
//! Begin/end frames carry three text fields (class, method, signature) for a
//! total of 112 bytes; value changes carry two (old, new) for 80 bytes.
//! Fields are packed one by one, so the layout never depends on host struct
//! padding.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::text::{FixedText, FIELD_LEN};

/// Length of the tag byte plus padding that opens every record.
pub const HEADER_LEN: usize = 16;

/// Length of the padding region after the tag byte.
pub const PADDING_LEN: usize = HEADER_LEN - 1;

/// Encoded size of a begin-frame or end-frame record.
pub const FRAME_RECORD_LEN: usize = HEADER_LEN + 3 * FIELD_LEN;

/// Encoded size of a value-change record.
pub const VALUE_CHANGE_RECORD_LEN: usize = HEADER_LEN + 2 * FIELD_LEN;

/// Discriminant stored in the first byte of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RecordTag {
    /// Start of a traced method invocation.
    BeginFrame = b'B',
    /// End of a traced method invocation.
    EndFrame = b'E',
    /// Integer value snapshot before and after a change.
    ValueChange = b'I',
}

impl RecordTag {
    /// On-wire byte.
    #[inline]
    #[must_use]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Map a tag byte back to its variant.
    #[must_use]
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'B' => Some(Self::BeginFrame),
            b'E' => Some(Self::EndFrame),
            b'I' => Some(Self::ValueChange),
            _ => None,
        }
    }

    /// Encoded size of every record carrying this tag.
    #[inline]
    #[must_use]
    pub const fn record_len(self) -> usize {
        match self {
            Self::BeginFrame | Self::EndFrame => FRAME_RECORD_LEN,
            Self::ValueChange => VALUE_CHANGE_RECORD_LEN,
        }
    }
}

/// Identity of a traced method: class, method name, and signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameIdent {
    /// Owning class, e.g. `java/lang/String`.
    pub class_name: FixedText,
    /// Method name, e.g. `getBytes`.
    pub method_name: FixedText,
    /// Method type signature, e.g. `()[B`.
    pub method_type: FixedText,
}

impl FrameIdent {
    /// Build an identity, truncating overlong names.
    #[must_use]
    pub fn new(class_name: &str, method_name: &str, method_type: &str) -> Self {
        Self {
            class_name: FixedText::new(class_name),
            method_name: FixedText::new(method_name),
            method_type: FixedText::new(method_type),
        }
    }

    /// Build an identity, rejecting overlong names.
    pub fn try_new(
        class_name: &str,
        method_name: &str,
        method_type: &str,
    ) -> crate::Result<Self> {
        Ok(Self {
            class_name: FixedText::try_new(class_name)?,
            method_name: FixedText::try_new(method_name)?,
            method_type: FixedText::try_new(method_type)?,
        })
    }

    fn fields(&self) -> [&FixedText; 3] {
        [&self.class_name, &self.method_name, &self.method_type]
    }
}

/// Old/new snapshot pair of a value-change record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueChange {
    /// Value before the change.
    pub old_value: FixedText,
    /// Value after the change.
    pub new_value: FixedText,
}

impl ValueChange {
    /// Build a value change from already-rendered text.
    #[must_use]
    pub fn new(old_value: &str, new_value: &str) -> Self {
        Self {
            old_value: FixedText::new(old_value),
            new_value: FixedText::new(new_value),
        }
    }

    /// The change that follows this one: our new value becomes its old value.
    #[must_use]
    pub fn chain(&self, new_value: &str) -> Self {
        Self {
            old_value: self.new_value,
            new_value: FixedText::new(new_value),
        }
    }
}

/// A logical trace record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Record {
    /// Frame entry.
    BeginFrame(FrameIdent),
    /// Frame exit.
    EndFrame(FrameIdent),
    /// Integer change inside the frame.
    ValueChange(ValueChange),
}

impl Record {
    /// Tag byte this record is encoded with.
    #[must_use]
    pub const fn tag(&self) -> RecordTag {
        match self {
            Self::BeginFrame(_) => RecordTag::BeginFrame,
            Self::EndFrame(_) => RecordTag::EndFrame,
            Self::ValueChange(_) => RecordTag::ValueChange,
        }
    }

    /// Exact number of bytes [`Record::encode_into`] will emit.
    #[inline]
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        self.tag().record_len()
    }

    /// Write the record field by field into `w`.
    pub fn encode_into<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        write_header(w, self.tag())?;
        match self {
            Self::BeginFrame(ident) | Self::EndFrame(ident) => {
                for field in ident.fields() {
                    w.write_all(field.as_bytes())?;
                }
            }
            Self::ValueChange(vc) => {
                w.write_all(vc.old_value.as_bytes())?;
                w.write_all(vc.new_value.as_bytes())?;
            }
        }
        Ok(())
    }

    /// Encode into a freshly allocated buffer of [`Record::encoded_len`] bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::BeginFrame(ident) | Self::EndFrame(ident) => {
                encode_frame(self.tag(), ident).to_vec()
            }
            Self::ValueChange(vc) => encode_change(vc).to_vec(),
        }
    }
}

fn write_header<W: Write + ?Sized>(w: &mut W, tag: RecordTag) -> io::Result<()> {
    w.write_all(&[tag.byte()])?;
    w.write_all(&[0u8; PADDING_LEN])
}

fn encode_frame(tag: RecordTag, ident: &FrameIdent) -> [u8; FRAME_RECORD_LEN] {
    let mut out = [0u8; FRAME_RECORD_LEN];
    out[0] = tag.byte();
    for (i, field) in ident.fields().into_iter().enumerate() {
        let at = HEADER_LEN + i * FIELD_LEN;
        out[at..at + FIELD_LEN].copy_from_slice(field.as_bytes());
    }
    out
}

fn encode_change(vc: &ValueChange) -> [u8; VALUE_CHANGE_RECORD_LEN] {
    let mut out = [0u8; VALUE_CHANGE_RECORD_LEN];
    out[0] = RecordTag::ValueChange.byte();
    out[HEADER_LEN..HEADER_LEN + FIELD_LEN].copy_from_slice(vc.old_value.as_bytes());
    out[HEADER_LEN + FIELD_LEN..].copy_from_slice(vc.new_value.as_bytes());
    out
}

/// Encode a begin-frame record (112 bytes). Overlong names are truncated.
#[must_use]
pub fn encode_begin_frame(
    class_name: &str,
    method_name: &str,
    method_type: &str,
) -> [u8; FRAME_RECORD_LEN] {
    encode_frame(
        RecordTag::BeginFrame,
        &FrameIdent::new(class_name, method_name, method_type),
    )
}

/// Encode an end-frame record (112 bytes).
///
/// Matching the begin-frame's identity is a caller convention; nothing here
/// checks it.
#[must_use]
pub fn encode_end_frame(
    class_name: &str,
    method_name: &str,
    method_type: &str,
) -> [u8; FRAME_RECORD_LEN] {
    encode_frame(
        RecordTag::EndFrame,
        &FrameIdent::new(class_name, method_name, method_type),
    )
}

/// Encode a value-change record (80 bytes).
#[must_use]
pub fn encode_value_change(old_value: &str, new_value: &str) -> [u8; VALUE_CHANGE_RECORD_LEN] {
    encode_change(&ValueChange::new(old_value, new_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_layout() {
        assert_eq!(FRAME_RECORD_LEN, 112);
        assert_eq!(VALUE_CHANGE_RECORD_LEN, 80);
    }

    #[test]
    fn begin_frame_layout() {
        let b = encode_begin_frame("java/lang/String", "getBytes", "()[B");
        assert_eq!(b[0], b'B');
        assert!(b[1..16].iter().all(|&x| x == 0));
        assert_eq!(&b[16..32], b"java/lang/String");
        assert_eq!(&b[48..56], b"getBytes");
        assert_eq!(&b[80..84], b"()[B");
        assert_eq!(b[111], b' ');
    }

    #[test]
    fn value_change_layout() {
        let b = encode_value_change("41", "42");
        assert_eq!(b[0], b'I');
        assert_eq!(&b[16..18], b"41");
        assert_eq!(&b[48..50], b"42");
        assert_eq!(b.len(), 80);
    }

    #[test]
    fn streaming_encoder_matches_array_encoders() {
        let ident = FrameIdent::new("C", "m", "()V");
        assert_eq!(
            Record::EndFrame(ident).to_bytes(),
            encode_end_frame("C", "m", "()V").to_vec()
        );
        let vc = ValueChange::new("0", "1");
        assert_eq!(
            Record::ValueChange(vc).to_bytes(),
            encode_value_change("0", "1").to_vec()
        );
    }

    #[test]
    fn to_bytes_matches_streamed_encoding() {
        let ident = FrameIdent::new("java/lang/String", "getBytes", "()[B");
        let records = [
            Record::BeginFrame(ident),
            Record::ValueChange(ValueChange::new("0", "1")),
            Record::EndFrame(ident),
        ];
        for rec in records {
            let mut streamed = Vec::new();
            rec.encode_into(&mut streamed).unwrap();
            let buf = rec.to_bytes();
            assert_eq!(buf.len(), rec.encoded_len());
            assert_eq!(buf, streamed, "{:?}", rec.tag());
        }
    }

    #[test]
    fn chain_moves_new_into_old() {
        let first = ValueChange::new("0", "1");
        let second = first.chain("2");
        assert_eq!(second.old_value, first.new_value);
        assert_eq!(second.new_value.trimmed(), b"2");
    }

    #[test]
    fn tag_byte_roundtrips() {
        for tag in [RecordTag::BeginFrame, RecordTag::EndFrame, RecordTag::ValueChange] {
            assert_eq!(RecordTag::from_byte(tag.byte()), Some(tag));
        }
        assert_eq!(RecordTag::from_byte(b'X'), None);
    }
}
