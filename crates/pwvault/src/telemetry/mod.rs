//! Tracing setup: structured JSON logs, plus OTLP span export when configured.
//!
//! # Telemetry invariants
//!
//! - **No plaintext, token or key material** may appear in any span attribute
//!   or log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`).

pub mod init;

pub use init::{init_telemetry, shutdown_telemetry};
