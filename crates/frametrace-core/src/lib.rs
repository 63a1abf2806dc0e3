//! frametrace-core: fixed-layout trace records and the paired data/index writer.
//!
//! This crate owns the two pieces with a wire contract:
//! - the **record codec** (`record`, `text`): begin-frame, end-frame and
//!   value-change records packed field by field into 112/80-byte layouts;
//! - the **dual writer** (`writer`, `index`): appends a 12-byte
//!   `(record_number, offset)` entry to the index stream, then the record to
//!   the data stream, keeping entry `N` pointed at the start of record `N`.
//!
//! ```no_run
//! use frametrace_core::{DualWriter, FrameIdent, Record, ValueChange};
//!
//! let mut w = DualWriter::create("trace.index", "trace.data")?;
//! let ident = FrameIdent::new("java/lang/String", "getBytes", "()[B");
//! w.append(&Record::BeginFrame(ident))?;
//! w.append(&Record::ValueChange(ValueChange::new("0", "1")))?;
//! w.append(&Record::EndFrame(ident))?;
//! let summary = w.finish()?;
//! assert_eq!(summary.data_len, 112 + 80 + 112);
//! # Ok::<(), frametrace_core::TraceError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

/// Typed error enum and result alias.
pub mod error;
/// Sequential index log entry layout.
pub mod index;
/// Record shapes, tags and their byte encoders.
pub mod record;
/// Fixed-width space-padded text fields.
pub mod text;
/// Dual-stream append writer.
pub mod writer;

pub use error::{Result, Stream, TraceError};
pub use index::IndexEntry;
pub use record::{
    encode_begin_frame, encode_end_frame, encode_value_change, FrameIdent, Record, RecordTag,
    ValueChange, FRAME_RECORD_LEN, VALUE_CHANGE_RECORD_LEN,
};
pub use text::{FixedText, FIELD_LEN};
pub use writer::{DualWriter, SizedSink, WriterSummary};
