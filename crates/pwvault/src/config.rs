//! Configuration loading and validation for the vault service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use std::fmt;

use anyhow::{Context, Result};
use pwcrypt::{kdf::ITERATION_RANGE, MasterKey};
use serde::Deserialize;

use crate::server::state::{DEFAULT_MAX_CONCURRENT_CIPHER_OPS, DEFAULT_MAX_TOKEN_ITERATIONS};

/// Validated service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Base64 of the 32-byte master key. **Required.** Never logged.
    pub master_key: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Largest request body accepted, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Cipher calls allowed on the blocking pool at once.
    #[serde(default = "default_max_concurrent_cipher_ops")]
    pub max_concurrent_cipher_ops: usize,

    /// Largest PBKDF2 work factor accepted in a submitted token.
    #[serde(default = "default_max_token_iterations")]
    pub max_token_iterations: u32,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// OTLP collector endpoint. Span export is disabled when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,
}

fn default_listen_port() -> u16 {
    8080
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}
fn default_max_concurrent_cipher_ops() -> usize {
    DEFAULT_MAX_CONCURRENT_CIPHER_OPS
}
fn default_max_token_iterations() -> u32 {
    DEFAULT_MAX_TOKEN_ITERATIONS
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Decode the master key.
    ///
    /// # Errors
    ///
    /// Fails unless `MASTER_KEY` is base64 of exactly 32 bytes.
    pub fn master_key(&self) -> Result<MasterKey> {
        MasterKey::from_base64(&self.master_key).context("MASTER_KEY is invalid")
    }

    /// The OTLP endpoint, treating a blank value as unset.
    pub fn otlp_endpoint(&self) -> Option<&str> {
        self.otel_exporter_otlp_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.master_key, "MASTER_KEY")?;
        self.master_key()?;
        ensure_non_empty(&self.log_level, "LOG_LEVEL")?;

        if self.listen_port == 0 {
            anyhow::bail!("LISTEN_PORT must be > 0");
        }
        if self.max_body_bytes == 0 {
            anyhow::bail!("MAX_BODY_BYTES must be > 0");
        }
        if self.max_concurrent_cipher_ops == 0 {
            anyhow::bail!("MAX_CONCURRENT_CIPHER_OPS must be > 0");
        }
        // Must admit every token this service issues.
        if self.max_token_iterations < ITERATION_RANGE.end - 1 {
            anyhow::bail!(
                "MAX_TOKEN_ITERATIONS must be at least {}",
                ITERATION_RANGE.end - 1
            );
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("master_key", &"[REDACTED]")
            .field("listen_port", &self.listen_port)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("max_concurrent_cipher_ops", &self.max_concurrent_cipher_ops)
            .field("max_token_iterations", &self.max_token_iterations)
            .field("log_level", &self.log_level)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .finish()
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // base64 of bytes 0..32
    const KEY_B64: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";

    fn valid() -> Config {
        Config {
            master_key: KEY_B64.into(),
            listen_port: default_listen_port(),
            max_body_bytes: default_max_body_bytes(),
            max_concurrent_cipher_ops: default_max_concurrent_cipher_ops(),
            max_token_iterations: default_max_token_iterations(),
            log_level: default_log_level(),
            otel_exporter_otlp_endpoint: None,
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_listen_port(), 8080);
        assert_eq!(default_max_body_bytes(), 65_536);
        assert_eq!(default_max_concurrent_cipher_ops(), 32);
        assert_eq!(default_max_token_iterations(), 1_000_000);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_accepts_valid_config() {
        let cfg = valid();
        assert!(cfg.validate().is_ok());
        let expected: Vec<u8> = (0u8..32).collect();
        assert_eq!(cfg.master_key().unwrap().as_bytes().as_slice(), expected.as_slice());
    }

    #[test]
    fn validate_rejects_empty_master_key() {
        let cfg = Config {
            master_key: "  ".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_short_master_key() {
        // 16 bytes
        let cfg = Config {
            master_key: "AAECAwQFBgcICQoLDA0ODw==".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_base64_master_key() {
        let cfg = Config {
            master_key: "not base64!".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_port_and_body_limit() {
        assert!(Config {
            listen_port: 0,
            ..valid()
        }
        .validate()
        .is_err());
        assert!(Config {
            max_body_bytes: 0,
            ..valid()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn validate_rejects_bad_work_limits() {
        assert!(Config {
            max_concurrent_cipher_ops: 0,
            ..valid()
        }
        .validate()
        .is_err());
        // Below the largest work factor new tokens can carry.
        assert!(Config {
            max_token_iterations: 20_000,
            ..valid()
        }
        .validate()
        .is_err());
        assert!(Config {
            max_token_iterations: 49_999,
            ..valid()
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn blank_otlp_endpoint_is_unset() {
        let cfg = Config {
            otel_exporter_otlp_endpoint: Some(" ".into()),
            ..valid()
        };
        assert_eq!(cfg.otlp_endpoint(), None);

        let cfg = Config {
            otel_exporter_otlp_endpoint: Some("http://collector:4317".into()),
            ..valid()
        };
        assert_eq!(cfg.otlp_endpoint(), Some("http://collector:4317"));
    }

    #[test]
    fn debug_redacts_master_key() {
        let dbg = format!("{:?}", valid());
        assert!(dbg.contains("[REDACTED]"));
        assert!(!dbg.contains(KEY_B64));
    }
}
