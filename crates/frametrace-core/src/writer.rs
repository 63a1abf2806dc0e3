//! Dual-stream writer keeping the index log and the data file in step.
//!
//! For every record the writer
//! 1. probes the current data length (this is the record's offset),
//! 2. appends a 12-byte [`IndexEntry`] to the index stream,
//! 3. appends the encoded record to the data stream.
//!
//! The running offset is also tracked in memory and checked against every
//! probe, so index entry `N` always names the byte where record `N` starts.
//! A failure between steps 2 and 3 leaves an index entry pointing past the end
//! of the data; that state is reported to the caller and left on disk as-is.

use std::fs::File;
use std::io::{self, Cursor, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, Stream, TraceError};
use crate::index::IndexEntry;
use crate::record::Record;

/// A byte sink that can report how many bytes it currently holds.
pub trait SizedSink: Write {
    /// Current length of the stream in bytes.
    fn stream_len(&mut self) -> io::Result<u64>;
}

impl SizedSink for File {
    fn stream_len(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

impl SizedSink for Vec<u8> {
    fn stream_len(&mut self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }
}

impl SizedSink for Cursor<Vec<u8>> {
    fn stream_len(&mut self) -> io::Result<u64> {
        Ok(self.get_ref().len() as u64)
    }
}

impl<S: SizedSink + ?Sized> SizedSink for &mut S {
    fn stream_len(&mut self) -> io::Result<u64> {
        (**self).stream_len()
    }
}

/// Totals reported once both streams are flushed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterSummary {
    /// Number of records (and index entries) written.
    pub records: u64,
    /// Data stream length in bytes.
    pub data_len: u64,
    /// Index stream length in bytes.
    pub index_len: u64,
}

/// Single-writer, append-only pair of index and data streams.
#[derive(Debug)]
pub struct DualWriter<I: Write, D: SizedSink> {
    index: I,
    data: D,
    /// Cumulative data length; the offset the next record will get.
    next_offset: u64,
    next_record: i32,
    records: u64,
}

impl DualWriter<File, File> {
    /// Create (truncating) the index and data files and wrap them.
    ///
    /// Both handles are unbuffered so the data file's metadata length always
    /// reflects every completed append.
    pub fn create(index_path: impl AsRef<Path>, data_path: impl AsRef<Path>) -> Result<Self> {
        let index = create_file(index_path.as_ref())?;
        let data = create_file(data_path.as_ref())?;
        Self::new(index, data)
    }
}

fn create_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| TraceError::FileCreate {
        path: path.to_path_buf(),
        source,
    })
}

impl<I: Write, D: SizedSink> DualWriter<I, D> {
    /// Wrap existing streams. The data stream is probed once to seed the
    /// running offset; record numbering starts at 0.
    pub fn new(index: I, mut data: D) -> Result<Self> {
        let next_offset = data.stream_len().map_err(|source| TraceError::SizeProbe {
            record_number: None,
            source,
        })?;
        Ok(Self {
            index,
            data,
            next_offset,
            next_record: 0,
            records: 0,
        })
    }

    /// Record number the next append must use.
    #[inline]
    #[must_use]
    pub const fn next_record_number(&self) -> i32 {
        self.next_record
    }

    /// Data offset the next record will be written at.
    #[inline]
    #[must_use]
    pub const fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Number of records appended so far.
    #[inline]
    #[must_use]
    pub const fn records_written(&self) -> u64 {
        self.records
    }

    /// Append an already-encoded record under `record_number`.
    ///
    /// `record_number` must be exactly [`DualWriter::next_record_number`];
    /// anything else is rejected before either stream is touched.
    pub fn append_record(&mut self, record_number: i32, encoded: &[u8]) -> Result<IndexEntry> {
        if record_number != self.next_record {
            return Err(TraceError::OutOfSequence {
                expected: self.next_record,
                got: record_number,
            });
        }
        let following = record_number
            .checked_add(1)
            .ok_or(TraceError::PositionOverflow { record_number })?;

        let probed = self.data.stream_len().map_err(|source| TraceError::SizeProbe {
            record_number: Some(record_number),
            source,
        })?;
        if probed != self.next_offset {
            return Err(TraceError::OffsetDrift {
                record_number,
                expected: self.next_offset,
                actual: probed,
            });
        }

        let offset =
            i64::try_from(probed).map_err(|_| TraceError::PositionOverflow { record_number })?;
        let end = probed
            .checked_add(encoded.len() as u64)
            .filter(|&e| i64::try_from(e).is_ok())
            .ok_or(TraceError::PositionOverflow { record_number })?;

        let entry = IndexEntry::new(record_number, offset);
        entry
            .write_to(&mut self.index)
            .map_err(|source| TraceError::Write {
                stream: Stream::Index,
                record_number,
                offset,
                source,
            })?;

        if let Err(source) = self.data.write_all(encoded) {
            warn!(
                record_number,
                offset, "index entry written but record data was not; index now points past data"
            );
            return Err(TraceError::Write {
                stream: Stream::Data,
                record_number,
                offset,
                source,
            });
        }

        debug!(record_number, offset, len = encoded.len(), "appended record");
        self.next_offset = end;
        self.next_record = following;
        self.records += 1;
        Ok(entry)
    }

    /// Encode `record` and append it under the next record number.
    pub fn append(&mut self, record: &Record) -> Result<IndexEntry> {
        let bytes = record.to_bytes();
        debug_assert_eq!(bytes.len(), record.encoded_len());
        self.append_record(self.next_record, &bytes)
    }

    /// Flush both streams, index first.
    ///
    /// Flush failures are reported against the next record position.
    pub fn flush(&mut self) -> Result<()> {
        let (record_number, offset) = self.position();
        self.index.flush().map_err(|source| TraceError::Write {
            stream: Stream::Index,
            record_number,
            offset,
            source,
        })?;
        self.data.flush().map_err(|source| TraceError::Write {
            stream: Stream::Data,
            record_number,
            offset,
            source,
        })
    }

    /// Flush and release both streams, returning the totals.
    pub fn finish(mut self) -> Result<WriterSummary> {
        self.flush()?;
        Ok(self.summary())
    }

    /// Totals so far, without flushing.
    #[must_use]
    pub const fn summary(&self) -> WriterSummary {
        WriterSummary {
            records: self.records,
            data_len: self.next_offset,
            index_len: self.records * IndexEntry::SIZE as u64,
        }
    }

    /// Give back the underlying streams.
    pub fn into_inner(self) -> (I, D) {
        (self.index, self.data)
    }

    /// Borrow the index stream.
    pub const fn index_ref(&self) -> &I {
        &self.index
    }

    /// Borrow the data stream.
    pub const fn data_ref(&self) -> &D {
        &self.data
    }

    fn position(&self) -> (i32, i64) {
        (
            self.next_record,
            i64::try_from(self.next_offset).unwrap_or(i64::MAX),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FrameIdent, ValueChange};

    fn mem_writer() -> DualWriter<Vec<u8>, Vec<u8>> {
        DualWriter::new(Vec::new(), Vec::new()).unwrap()
    }

    #[test]
    fn offsets_accumulate_mixed_sizes() {
        let mut w = mem_writer();
        let ident = FrameIdent::new("C", "m", "()V");
        let e0 = w.append(&Record::BeginFrame(ident)).unwrap();
        let e1 = w.append(&Record::ValueChange(ValueChange::new("0", "1"))).unwrap();
        let e2 = w.append(&Record::EndFrame(ident)).unwrap();
        assert_eq!(e0, IndexEntry::new(0, 0));
        assert_eq!(e1, IndexEntry::new(1, 112));
        assert_eq!(e2, IndexEntry::new(2, 192));

        let summary = w.finish().unwrap();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.data_len, 304);
        assert_eq!(summary.index_len, 36);
    }

    #[test]
    fn out_of_sequence_writes_nothing() {
        let mut w = mem_writer();
        let err = w.append_record(1, &[0u8; 80]).unwrap_err();
        assert!(matches!(err, TraceError::OutOfSequence { expected: 0, got: 1 }));
        let (index, data) = w.into_inner();
        assert!(index.is_empty());
        assert!(data.is_empty());
    }

    #[test]
    fn seeds_offset_from_existing_data() {
        let mut w = DualWriter::new(Vec::new(), vec![0u8; 10]).unwrap();
        assert_eq!(w.next_offset(), 10);
        let e = w.append_record(0, b"abc").unwrap();
        assert_eq!(e.offset, 10);
        assert_eq!(w.next_offset(), 13);
    }

    #[test]
    fn drift_between_probe_and_tracked_offset_is_reported() {
        let mut data = Vec::new();
        {
            let mut w = DualWriter::new(Vec::new(), &mut data).unwrap();
            w.append_record(0, b"abcd").unwrap();
            // Write behind the writer's back through the same sink.
            let (_, sink) = w.into_inner();
            sink.extend_from_slice(b"xx");
        }
        let mut w = DualWriter::new(Vec::new(), &mut data).unwrap();
        assert_eq!(w.next_offset(), 6);
        w.append_record(0, b"z").unwrap();
        w.data.push(b'!');
        let err = w.append_record(1, b"z").unwrap_err();
        assert!(matches!(
            err,
            TraceError::OffsetDrift { record_number: 1, expected: 7, actual: 8 }
        ));
    }
}
