//! BLAKE3 manifest over a finished session's two files.
//!
//! The manifest pins the lengths and digests of the data and index files so a
//! later run can tell whether either was modified or cut short. It never
//! interprets record contents.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use blake3::Hasher;
use serde::{Deserialize, Serialize};

use crate::session::SessionReport;

/// Format version for `SessionManifest`.
pub const MANIFEST_VERSION: u32 = 1;

/// Length and digest of one output file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileDigest {
    /// File the digest was taken over.
    pub path: PathBuf,
    /// Length in bytes.
    pub len: u64,
    /// BLAKE3 digest, lowercase hex.
    pub blake3: String,
}

/// Commitment over one capture session's outputs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionManifest {
    /// Schema version.
    pub version: u32,
    /// Records written (begin + changes + end).
    pub records: u64,
    /// Value-change records among them.
    pub value_changes: u32,
    /// Data file digest.
    pub data: FileDigest,
    /// Index file digest.
    pub index: FileDigest,
}

fn digest_file(path: &Path) -> Result<FileDigest> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut rdr = BufReader::new(f);
    let mut h = Hasher::new();
    let len = io::copy(&mut rdr, &mut h).with_context(|| format!("hash {}", path.display()))?;
    Ok(FileDigest {
        path: path.to_path_buf(),
        len,
        blake3: hex::encode(h.finalize().as_bytes()),
    })
}

impl SessionManifest {
    /// Hash both files of a finished session.
    ///
    /// Fails if a file's on-disk length differs from what the writer reported.
    pub fn from_report(report: &SessionReport) -> Result<Self> {
        let data = digest_file(&report.data_path)?;
        let index = digest_file(&report.index_path)?;
        if data.len != report.summary.data_len {
            bail!(
                "data file is {} bytes, writer reported {}",
                data.len,
                report.summary.data_len
            );
        }
        if index.len != report.summary.index_len {
            bail!(
                "index file is {} bytes, writer reported {}",
                index.len,
                report.summary.index_len
            );
        }
        Ok(Self {
            version: MANIFEST_VERSION,
            records: report.summary.records,
            value_changes: report.value_changes,
            data,
            index,
        })
    }

    /// Re-hash both files and compare against this manifest.
    pub fn verify(&self) -> Result<()> {
        if self.version != MANIFEST_VERSION {
            bail!(
                "unsupported manifest version {} (expected {MANIFEST_VERSION})",
                self.version
            );
        }
        for (what, want) in [("data", &self.data), ("index", &self.index)] {
            let got = digest_file(&want.path)?;
            if got.len != want.len {
                bail!(
                    "{what} length mismatch: manifest={}, recomputed={}",
                    want.len,
                    got.len
                );
            }
            if got.blake3 != want.blake3 {
                bail!(
                    "{what} digest mismatch: manifest={}, recomputed={}",
                    want.blake3,
                    got.blake3
                );
            }
        }
        Ok(())
    }
}

/// Read a manifest file and verify the files it names.
pub fn verify_manifest_file<P: AsRef<Path>>(path: P) -> Result<SessionManifest> {
    let man = crate::io::read_manifest_auto(&path)?;
    man.verify()
        .with_context(|| format!("verifying {}", path.as_ref().display()))?;
    Ok(man)
}
