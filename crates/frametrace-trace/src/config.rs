//! Session configuration.
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change. The defaults reproduce the reference trace: 100 value changes
//! inside `java/lang/String.getBytes()[B`, written to `saucisse.data` /
//! `saucisse.index`.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Default data file path.
pub const DEFAULT_DATA_PATH: &str = "saucisse.data";
/// Default index file path.
pub const DEFAULT_INDEX_PATH: &str = "saucisse.index";
/// Default number of value-change records per session.
pub const DEFAULT_VALUE_CHANGES: u32 = 100;

/// Largest value-change count the writer can number: the record after the
/// end-frame must still be representable as an `i32`.
pub const MAX_VALUE_CHANGES: u32 = (i32::MAX - 2) as u32;

/// Identity of the traced frame, as plain strings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FrameConfig {
    /// Class owning the traced method.
    pub class_name: String,
    /// Traced method name.
    pub method_name: String,
    /// Traced method signature.
    pub method_type: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            class_name: "java/lang/String".to_owned(),
            method_name: "getBytes".to_owned(),
            method_type: "()[B".to_owned(),
        }
    }
}

/// Everything a capture session needs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Record data output.
    pub data_path: PathBuf,
    /// Index log output.
    pub index_path: PathBuf,
    /// Number `N` of value-change records between the two frame records.
    pub value_changes: u32,
    /// Frame identity shared by the begin and end records.
    pub frame: FrameConfig,
    /// Reject text fields longer than 32 bytes instead of truncating them.
    pub strict_fields: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            value_changes: DEFAULT_VALUE_CHANGES,
            frame: FrameConfig::default(),
            strict_fields: false,
        }
    }
}

impl SessionConfig {
    /// Check the config can produce a well-formed session.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.value_changes <= MAX_VALUE_CHANGES,
            "value_changes {} exceeds {MAX_VALUE_CHANGES} (record numbers are i32)",
            self.value_changes
        );
        ensure!(
            self.data_path != self.index_path,
            "data and index paths must differ ({})",
            self.data_path.display()
        );
        Ok(())
    }

    /// Total records a session writes: begin + `N` changes + end.
    #[must_use]
    pub const fn total_records(&self) -> u64 {
        self.value_changes as u64 + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_trace() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.value_changes, 100);
        assert_eq!(cfg.total_records(), 102);
        assert_eq!(cfg.data_path, PathBuf::from("saucisse.data"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_same_path_for_both_streams() {
        let cfg = SessionConfig {
            index_path: PathBuf::from(DEFAULT_DATA_PATH),
            ..SessionConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_count_past_record_number_range() {
        let cfg = SessionConfig { value_changes: u32::MAX, ..SessionConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = SessionConfig { value_changes: MAX_VALUE_CHANGES, ..SessionConfig::default() };
        assert!(cfg.validate().is_ok());
    }
}
