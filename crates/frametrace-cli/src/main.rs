// crates/frametrace-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use frametrace_trace::{
    config::SessionConfig,
    io::{read_config_auto, write_manifest_auto},
    manifest::{verify_manifest_file, SessionManifest},
    session::capture,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "frametrace",
    about = "Synthetic frame trace generator",
    long_about = "Synthetic frame trace generator.\n\nWrites a fixed-layout record file plus a parallel (record number, offset) index log.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run one capture session: begin-frame, N value changes, end-frame.
    Capture {
        /// Session config (JSON/CBOR); flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output path for record data
        #[arg(long)]
        data: Option<PathBuf>,

        /// Output path for the index log
        #[arg(long)]
        index: Option<PathBuf>,

        /// Number of value-change records N
        #[arg(long)]
        records: Option<u32>,

        /// Class name of the traced frame
        #[arg(long)]
        class: Option<String>,

        /// Method name of the traced frame
        #[arg(long)]
        method: Option<String>,

        /// Method signature of the traced frame
        #[arg(long)]
        signature: Option<String>,

        /// Fail on text fields longer than 32 bytes instead of truncating.
        /// Only enables strict mode: a config file with `strict_fields: true`
        /// stays strict whether or not the flag is given.
        #[arg(long, default_value_t = false)]
        strict: bool,

        /// Write a BLAKE3 manifest of both output files (CBOR/JSON)
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Print the session report as JSON on stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Check that the files named in a manifest are unchanged
    VerifyManifest {
        /// Input path to manifest (CBOR/JSON)
        #[arg(long)]
        manifest: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Capture {
            config,
            data,
            index,
            records,
            class,
            method,
            signature,
            strict,
            manifest,
            json,
        } => {
            let mut cfg = match config {
                Some(path) => read_config_auto(&path)
                    .with_context(|| format!("reading config {}", path.display()))?,
                None => SessionConfig::default(),
            };
            apply_overrides(
                &mut cfg,
                Overrides { data, index, records, class, method, signature, strict },
            );
            run_capture(&cfg, manifest.as_deref(), json)
        }

        Cmd::VerifyManifest { manifest } => verify(&manifest),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Command-line values that replace config file fields when present.
struct Overrides {
    data: Option<PathBuf>,
    index: Option<PathBuf>,
    records: Option<u32>,
    class: Option<String>,
    method: Option<String>,
    signature: Option<String>,
    strict: bool,
}

fn apply_overrides(cfg: &mut SessionConfig, o: Overrides) {
    if let Some(p) = o.data {
        cfg.data_path = p;
    }
    if let Some(p) = o.index {
        cfg.index_path = p;
    }
    if let Some(n) = o.records {
        cfg.value_changes = n;
    }
    if let Some(s) = o.class {
        cfg.frame.class_name = s;
    }
    if let Some(s) = o.method {
        cfg.frame.method_name = s;
    }
    if let Some(s) = o.signature {
        cfg.frame.method_type = s;
    }
    cfg.strict_fields |= o.strict;
}

/// Ensure the parent directory for a file exists.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", dir.display()))?;
        }
    }
    Ok(())
}

fn run_capture(cfg: &SessionConfig, manifest: Option<&Path>, json: bool) -> Result<()> {
    ensure_parent_dir(&cfg.data_path)?;
    ensure_parent_dir(&cfg.index_path)?;

    let report = capture(cfg)?;

    if let Some(out) = manifest {
        ensure_parent_dir(out)?;
        let man = SessionManifest::from_report(&report).context("building session manifest")?;
        write_manifest_auto(out, &man)
            .with_context(|| format!("writing manifest to {}", out.display()))?;
        info!(manifest=%out.display(), data_blake3=%man.data.blake3, "wrote manifest");
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize session report")?
        );
    } else {
        println!(
            "Captured {} records (N={}) → {} ({} bytes), {} ({} bytes)",
            report.summary.records,
            report.value_changes,
            report.data_path.display(),
            report.summary.data_len,
            report.index_path.display(),
            report.summary.index_len
        );
    }
    Ok(())
}

fn verify(manifest: &Path) -> Result<()> {
    info!(manifest=%manifest.display(), "verifying manifest");
    let man = verify_manifest_file(manifest)?;
    println!(
        "OK: {} and {} match manifest {}",
        man.data.path.display(),
        man.index.path.display(),
        manifest.display()
    );
    Ok(())
}
