//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use pwcrypt::TokenCipher;
use tokio::sync::Semaphore;

/// Default cap on cipher operations running on the blocking pool at once.
pub const DEFAULT_MAX_CONCURRENT_CIPHER_OPS: usize = 32;

/// Default cap on the PBKDF2 work factor a submitted token may demand.
pub const DEFAULT_MAX_TOKEN_ITERATIONS: u32 = 1_000_000;

/// Application state shared across all request handlers.
///
/// Cloning is an `Arc` bump; the cipher and its master key are never copied.
#[derive(Clone)]
pub struct AppState {
    /// Token cipher keyed by the process master key.
    pub cipher: Arc<dyn TokenCipher>,
    /// One permit per in-flight cipher call. A permit is released only when
    /// the blocking work finishes, not when the request is dropped.
    pub cipher_permits: Arc<Semaphore>,
    /// Tokens asking for more PBKDF2 iterations than this are refused.
    pub max_token_iterations: u32,
}

impl AppState {
    /// Create a new [`AppState`] around `cipher` with default limits.
    pub fn new(cipher: impl TokenCipher + 'static) -> Self {
        Self::with_limits(
            cipher,
            DEFAULT_MAX_CONCURRENT_CIPHER_OPS,
            DEFAULT_MAX_TOKEN_ITERATIONS,
        )
    }

    /// Create a new [`AppState`] with explicit work limits.
    pub fn with_limits(
        cipher: impl TokenCipher + 'static,
        max_concurrent_ops: usize,
        max_token_iterations: u32,
    ) -> Self {
        Self {
            cipher: Arc::new(cipher),
            cipher_permits: Arc::new(Semaphore::new(max_concurrent_ops)),
            max_token_iterations,
        }
    }
}
