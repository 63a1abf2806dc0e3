//! Capture sessions on top of `frametrace-core`.
//!
//! - `config`: serde-backed `SessionConfig` with reference defaults.
//! - `session`: the record sequence of one session and the driver that
//!   streams it through a `DualWriter`.
//! - `manifest`: BLAKE3 digests over a finished session's files.
//! - `io`: JSON/CBOR read/write helpers for configs and manifests.
//!
//! Callers use module paths such as `frametrace_trace::session::capture`.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::missing_errors_doc)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Session configuration and its defaults.
pub mod config;
/// JSON/CBOR I/O helpers for configs and manifests.
pub mod io;
/// Integrity manifest over session outputs.
pub mod manifest;
/// Record sequence and capture driver.
pub mod session;
