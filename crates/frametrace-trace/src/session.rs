//! Capture session: one begin-frame, `N` chained value changes, one end-frame.
//!
//! Record numbering is fixed by the protocol:
//! - `0`       begin-frame with the configured identity,
//! - `1..=N`   value change; old = previous new (first old is `"0"`), new = the
//!   record number in decimal,
//! - `N + 1`   end-frame with the begin-frame's identity.
//!
//! Any failure aborts the session on the spot. Bytes already written stay in
//! both files and nothing is retried.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use frametrace_core::{DualWriter, FrameIdent, Record, SizedSink, ValueChange, WriterSummary};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SessionConfig;

/// Old value carried by the first value change of a session.
pub const INITIAL_VALUE: &str = "0";

/// Resolved, encoding-ready description of one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionPlan {
    /// Identity written into both frame records.
    pub ident: FrameIdent,
    /// Number of value-change records.
    pub value_changes: u32,
}

impl SessionPlan {
    /// Build a plan directly from an identity and a change count.
    #[must_use]
    pub const fn new(ident: FrameIdent, value_changes: u32) -> Self {
        Self { ident, value_changes }
    }

    /// Resolve a config. In strict mode an overlong frame name fails here,
    /// before any file exists.
    pub fn from_config(cfg: &SessionConfig) -> frametrace_core::Result<Self> {
        let f = &cfg.frame;
        let ident = if cfg.strict_fields {
            FrameIdent::try_new(&f.class_name, &f.method_name, &f.method_type)?
        } else {
            FrameIdent::new(&f.class_name, &f.method_name, &f.method_type)
        };
        Ok(Self::new(ident, cfg.value_changes))
    }

    /// The session's records in write order.
    #[must_use]
    pub const fn records(&self) -> PlanRecords {
        PlanRecords {
            plan: *self,
            next: 0,
            last_change: None,
        }
    }

    /// Number of records the plan yields.
    #[must_use]
    pub const fn total_records(&self) -> u64 {
        self.value_changes as u64 + 2
    }
}

/// Iterator over a [`SessionPlan`]'s records.
#[derive(Clone, Debug)]
pub struct PlanRecords {
    plan: SessionPlan,
    next: u64,
    last_change: Option<ValueChange>,
}

impl Iterator for PlanRecords {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let n = self.next;
        let last = u64::from(self.plan.value_changes) + 1;
        let rec = match n {
            0 => Record::BeginFrame(self.plan.ident),
            _ if n < last => {
                let new_value = n.to_string();
                let vc = self.last_change.map_or_else(
                    || ValueChange::new(INITIAL_VALUE, &new_value),
                    |prev| prev.chain(&new_value),
                );
                self.last_change = Some(vc);
                Record::ValueChange(vc)
            }
            _ if n == last => Record::EndFrame(self.plan.ident),
            _ => return None,
        };
        self.next += 1;
        Some(rec)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.plan.total_records().saturating_sub(self.next);
        let left = usize::try_from(left).unwrap_or(usize::MAX);
        (left, Some(left))
    }
}

impl ExactSizeIterator for PlanRecords {}

/// Outcome of a completed file-backed session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Data file written.
    pub data_path: PathBuf,
    /// Index file written.
    pub index_path: PathBuf,
    /// Number of value-change records.
    pub value_changes: u32,
    /// Stream totals from the writer.
    pub summary: WriterSummary,
}

/// Stream every record of `plan` through `writer`, stopping at the first error.
pub fn capture_into<I: Write, D: SizedSink>(
    writer: &mut DualWriter<I, D>,
    plan: &SessionPlan,
) -> frametrace_core::Result<()> {
    for record in plan.records() {
        writer.append(&record)?;
    }
    Ok(())
}

/// Run a full session against the files named in `cfg`.
///
/// Both files are created (truncated) first; both handles are released on
/// every return path.
pub fn capture(cfg: &SessionConfig) -> Result<SessionReport> {
    cfg.validate()?;
    let plan = SessionPlan::from_config(cfg).context("resolving frame identity")?;

    info!(
        data = %cfg.data_path.display(),
        index = %cfg.index_path.display(),
        value_changes = cfg.value_changes,
        "capture session starting"
    );

    let mut writer = DualWriter::create(&cfg.index_path, &cfg.data_path)
        .context("creating trace files")?;
    capture_into(&mut writer, &plan).with_context(|| {
        format!(
            "capture aborted after {} of {} records",
            writer.records_written(),
            plan.total_records()
        )
    })?;
    let summary = writer.finish().context("flushing trace files")?;

    info!(
        records = summary.records,
        data_len = summary.data_len,
        index_len = summary.index_len,
        "capture session finished"
    );

    Ok(SessionReport {
        data_path: cfg.data_path.clone(),
        index_path: cfg.index_path.clone(),
        value_changes: cfg.value_changes,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use frametrace_core::RecordTag;

    fn plan(n: u32) -> SessionPlan {
        SessionPlan::new(FrameIdent::new("java/lang/String", "getBytes", "()[B"), n)
    }

    #[test]
    fn record_sequence_shape() {
        let tags: Vec<RecordTag> = plan(3).records().map(|r| r.tag()).collect();
        assert_eq!(
            tags,
            vec![
                RecordTag::BeginFrame,
                RecordTag::ValueChange,
                RecordTag::ValueChange,
                RecordTag::ValueChange,
                RecordTag::EndFrame,
            ]
        );
        assert_eq!(plan(3).records().len(), 5);
    }

    #[test]
    fn zero_changes_is_just_the_frame() {
        let recs: Vec<Record> = plan(0).records().collect();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].tag(), RecordTag::BeginFrame);
        assert_eq!(recs[1].tag(), RecordTag::EndFrame);
    }

    #[test]
    fn values_chain_from_initial() {
        let changes: Vec<(String, String)> = plan(3)
            .records()
            .filter_map(|r| match r {
                Record::ValueChange(vc) => {
                    Some((vc.old_value.to_string_lossy(), vc.new_value.to_string_lossy()))
                }
                _ => None,
            })
            .collect();
        let want: Vec<(String, String)> = [("0", "1"), ("1", "2"), ("2", "3")]
            .iter()
            .map(|(a, b)| ((*a).to_owned(), (*b).to_owned()))
            .collect();
        assert_eq!(changes, want);
    }

    #[test]
    fn end_frame_reuses_begin_identity() {
        let recs: Vec<Record> = plan(2).records().collect();
        match (recs.first(), recs.last()) {
            (Some(Record::BeginFrame(b)), Some(Record::EndFrame(e))) => assert_eq!(b, e),
            other => panic!("unexpected frame records: {other:?}"),
        }
    }

    #[test]
    fn strict_plan_rejects_long_class_name() {
        let mut cfg = SessionConfig { strict_fields: true, ..SessionConfig::default() };
        cfg.frame.class_name = "x".repeat(33);
        assert!(SessionPlan::from_config(&cfg).is_err());
        cfg.strict_fields = false;
        assert!(SessionPlan::from_config(&cfg).is_ok());
    }
}
