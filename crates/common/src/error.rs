//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::AuthenticationFailed`] → 422
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Empty input, a malformed token, or an unknown algorithm id.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The token parsed but did not authenticate under this service's master key.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::AuthenticationFailed(_) => 422,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code placed in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::AuthenticationFailed(_) => "authentication_failed",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(ServiceError::BadRequest("x".into()).http_status(), 400);
        assert_eq!(
            ServiceError::AuthenticationFailed("x".into()).http_status(),
            422
        );
        assert_eq!(ServiceError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn codes_are_snake_case() {
        assert_eq!(ServiceError::BadRequest("x".into()).code(), "bad_request");
        assert_eq!(
            ServiceError::AuthenticationFailed("x".into()).code(),
            "authentication_failed"
        );
        assert_eq!(ServiceError::Internal("x".into()).code(), "internal_error");
    }

    #[test]
    fn display_includes_message() {
        let e = ServiceError::BadRequest("token must not be empty".into());
        assert!(e.to_string().contains("token must not be empty"));
    }
}
