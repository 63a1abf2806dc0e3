//! Typed failures surfaced by the codec and the dual writer.
//!
//! Every variant is terminal for the session that produced it: nothing in this
//! crate retries, rolls back, or repairs partially written output.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout `frametrace-core`.
pub type Result<T> = std::result::Result<T, TraceError>;

/// Which of the two output streams an I/O failure hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stream {
    /// The sequential index log (`record_number`, `offset`) pairs.
    Index,
    /// The record data file.
    Data,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index => f.write_str("index"),
            Self::Data => f.write_str("data"),
        }
    }
}

/// Errors produced while creating, sizing, or appending to the trace streams.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The data or index file could not be created/truncated.
    #[error("cannot create {}: {source}", .path.display())]
    FileCreate {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A write (or flush) to one of the streams failed.
    #[error("{stream} write failed at record {record_number} (offset {offset}): {source}")]
    Write {
        /// Stream that rejected the bytes.
        stream: Stream,
        /// Record being written when the failure happened.
        record_number: i32,
        /// Data offset the record was assigned.
        offset: i64,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The current data-stream length could not be determined.
    #[error("cannot probe data stream length{}: {source}", fmt_record(.record_number))]
    SizeProbe {
        /// Record about to be written, if the probe happened during an append.
        record_number: Option<i32>,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The probed data length disagrees with the writer's running offset.
    #[error("data stream length {actual} does not match tracked offset {expected} at record {record_number}")]
    OffsetDrift {
        /// Record about to be written.
        record_number: i32,
        /// Offset the writer accumulated from emitted sizes.
        expected: u64,
        /// Offset the sink reported.
        actual: u64,
    },

    /// A caller supplied a record number other than the next one in sequence.
    #[error("record number {got} out of sequence (expected {expected})")]
    OutOfSequence {
        /// Next record number the writer would accept.
        expected: i32,
        /// Record number the caller supplied.
        got: i32,
    },

    /// Strict field encoding rejected an overlong value.
    #[error("text field is {len} bytes, limit is {max}")]
    FieldTooLong {
        /// Length of the rejected input in bytes.
        len: usize,
        /// Field width.
        max: usize,
    },

    /// The data stream grew past what an `i64` offset or `i32` record number can express.
    #[error("trace position overflow at record {record_number}")]
    PositionOverflow {
        /// Record that would have overflowed.
        record_number: i32,
    },
}

fn fmt_record(record_number: &Option<i32>) -> String {
    record_number.map_or_else(String::new, |n| format!(" before record {n}"))
}

impl TraceError {
    /// The stream an I/O failure belongs to, when there is one.
    #[must_use]
    pub const fn stream(&self) -> Option<Stream> {
        match self {
            Self::Write { stream, .. } => Some(*stream),
            Self::SizeProbe { .. } | Self::OffsetDrift { .. } => Some(Stream::Data),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_stream_and_position() {
        let e = TraceError::Write {
            stream: Stream::Data,
            record_number: 4,
            offset: 352,
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        };
        let msg = e.to_string();
        assert!(msg.contains("data write failed"), "{msg}");
        assert!(msg.contains("record 4"), "{msg}");
        assert!(msg.contains("offset 352"), "{msg}");
        assert_eq!(e.stream(), Some(Stream::Data));
    }

    #[test]
    fn size_probe_message_mentions_record_when_known() {
        let e = TraceError::SizeProbe {
            record_number: Some(7),
            source: io::Error::new(io::ErrorKind::Other, "stat failed"),
        };
        assert!(e.to_string().contains("before record 7"));

        let e = TraceError::SizeProbe {
            record_number: None,
            source: io::Error::new(io::ErrorKind::Other, "stat failed"),
        };
        assert!(!e.to_string().contains("before record"));
    }
}
