//! JSON/CBOR helpers for session configs and manifests.
//!
//! Same rules for every payload: reads auto-detect `.json` / `.cbor`
//! (case-insensitive) and reject anything else; writes default to JSON when
//! the extension is missing or unknown.

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::config::SessionConfig;
use crate::manifest::SessionManifest;

/* ---------------- JSON ---------------- */

/// Read any `T` from **JSON**.
pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P, what: &str) -> Result<T> {
    let path_ref = path.as_ref();
    let f = File::open(path_ref).with_context(|| format!("open {}", display(path_ref)))?;
    let rdr = BufReader::new(f);
    serde_json::from_reader(rdr).with_context(|| format!("deserialize JSON {what}"))
}

/// Write any `T` to **JSON** (pretty).
pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, v: &T, what: &str) -> Result<()> {
    let path_ref = path.as_ref();
    let f = File::create(path_ref).with_context(|| format!("create {}", display(path_ref)))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, v).with_context(|| format!("serialize JSON {what}"))?;
    w.flush().with_context(|| "flush JSON writer")?;
    Ok(())
}

/* ---------------- CBOR ---------------- */

/// Read any `T` from **CBOR**.
pub fn read_cbor<T: DeserializeOwned, P: AsRef<Path>>(path: P, what: &str) -> Result<T> {
    let path_ref = path.as_ref();
    let f = File::open(path_ref).with_context(|| format!("open {}", display(path_ref)))?;
    let mut rdr = BufReader::new(f);
    ciborium::de::from_reader(&mut rdr).with_context(|| format!("deserialize CBOR {what}"))
}

/// Write any `T` to **CBOR**.
pub fn write_cbor<T: Serialize, P: AsRef<Path>>(path: P, v: &T, what: &str) -> Result<()> {
    let path_ref = path.as_ref();
    let f = File::create(path_ref).with_context(|| format!("create {}", display(path_ref)))?;
    let mut w = BufWriter::new(f);
    ciborium::ser::into_writer(v, &mut w).with_context(|| format!("serialize CBOR {what}"))?;
    w.flush().with_context(|| "flush CBOR writer")?;
    Ok(())
}

/* --------------- Auto-detect by extension --------------- */

fn read_auto<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    match ext_lower(path).as_deref() {
        Some("json") => read_json(path, what),
        Some("cbor") => read_cbor(path, what),
        Some(other) => Err(anyhow!(
            "unsupported {what} extension: {other} (supported: .json, .cbor)"
        )),
        None => Err(anyhow!("path has no extension (expected .json or .cbor)")),
    }
}

fn write_auto<T: Serialize>(path: &Path, v: &T, what: &str) -> Result<()> {
    match ext_lower(path).as_deref() {
        Some("cbor") => write_cbor(path, v, what),
        _ => write_json(path, v, what),
    }
}

/// Read a [`SessionConfig`] (`.json` / `.cbor`).
pub fn read_config_auto<P: AsRef<Path>>(path: P) -> Result<SessionConfig> {
    read_auto(path.as_ref(), "session config")
}

/// Write a [`SessionConfig`] (JSON unless the path ends in `.cbor`).
pub fn write_config_auto<P: AsRef<Path>>(path: P, v: &SessionConfig) -> Result<()> {
    write_auto(path.as_ref(), v, "session config")
}

/// Read a [`SessionManifest`] (`.json` / `.cbor`).
pub fn read_manifest_auto<P: AsRef<Path>>(path: P) -> Result<SessionManifest> {
    read_auto(path.as_ref(), "session manifest")
}

/// Write a [`SessionManifest`] (JSON unless the path ends in `.cbor`).
pub fn write_manifest_auto<P: AsRef<Path>>(path: P, v: &SessionManifest) -> Result<()> {
    write_auto(path.as_ref(), v, "session manifest")
}

/* ---------------- Small helpers ---------------- */

#[inline]
fn ext_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
}

#[inline]
fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_path(name: &str, ext: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("frametrace_io_{name}_{nanos}.{ext}"));
        p
    }

    #[test]
    fn config_json_roundtrip() {
        let path = tmp_path("config", "json");
        let cfg = SessionConfig { value_changes: 7, strict_fields: true, ..Default::default() };
        write_config_auto(&path, &cfg).unwrap();
        assert_eq!(read_config_auto(&path).unwrap(), cfg);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn config_cbor_roundtrip_upper_case_extension() {
        let path = tmp_path("config", "CBOR");
        let cfg = SessionConfig::default();
        write_config_auto(&path, &cfg).unwrap();
        assert_eq!(read_config_auto(&path).unwrap(), cfg);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn unknown_extension_rejected_on_read() {
        let err = read_config_auto("session.toml").unwrap_err();
        assert!(err.to_string().contains("unsupported session config extension"));
        let err = read_config_auto("session").unwrap_err();
        assert!(err.to_string().contains("no extension"));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let path = tmp_path("partial", "json");
        std::fs::write(&path, r#"{ "value_changes": 3 }"#).unwrap();
        let cfg = read_config_auto(&path).unwrap();
        assert_eq!(cfg.value_changes, 3);
        assert_eq!(cfg.frame.class_name, "java/lang/String");
        let _ = std::fs::remove_file(path);
    }
}
