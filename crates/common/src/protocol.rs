//! Request and response bodies for the `pwvault` HTTP API.
//!
//! Tokens travel as plain JSON strings; see `pwcrypt::token` for their format.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Encrypt endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /encrypt`.
#[derive(Clone, Serialize, Deserialize)]
pub struct EncryptRequest {
    /// The secret to protect. Must be non-empty.
    pub plaintext: String,
}

/// Successful response body for `POST /encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptResponse {
    /// `iterations|alg|salt|payload` token.
    pub token: String,
}

// ---------------------------------------------------------------------------
// Decrypt endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /decrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptRequest {
    pub token: String,
}

/// Successful response body for `POST /decrypt`.
#[derive(Clone, Serialize, Deserialize)]
pub struct DecryptResponse {
    pub plaintext: String,
}

// ---------------------------------------------------------------------------
// Verify endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /verify`: does `plaintext` match the secret in `token`?
#[derive(Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub plaintext: String,
    pub token: String,
}

/// Successful response body for `POST /verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(err: &crate::ServiceError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` once the service is accepting requests.
    pub status: String,
    /// Names of the algorithms new tokens may use.
    pub algorithms: Vec<String>,
}

// Bodies carrying secrets never print their contents.
macro_rules! redacted_debug {
    ($ty:ident { $($field:ident),* }) => {
        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    $(.field(stringify!($field), &"[REDACTED]"))*
                    .finish()
            }
        }
    };
}

redacted_debug!(EncryptRequest { plaintext });
redacted_debug!(DecryptResponse { plaintext });
redacted_debug!(VerifyRequest { plaintext, token });

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encrypt_request_round_trip() {
        let req = EncryptRequest {
            plaintext: "P@ssw0rd!".into(),
        };
        let json = serde_json::to_string(&req).unwrap();
        let decoded: EncryptRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.plaintext, "P@ssw0rd!");
    }

    #[test]
    fn verify_request_field_names() {
        let req: VerifyRequest =
            serde_json::from_value(json!({"plaintext": "a", "token": "1|1|x|y"})).unwrap();
        assert_eq!(req.token, "1|1|x|y");
    }

    #[test]
    fn secrets_redacted_in_debug() {
        let req = EncryptRequest {
            plaintext: "hunter2".into(),
        };
        let dbg = format!("{req:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("hunter2"));

        let resp = DecryptResponse {
            plaintext: "hunter2".into(),
        };
        assert!(!format!("{resp:?}").contains("hunter2"));
    }

    #[test]
    fn error_response_from_service_error() {
        let e = ErrorResponse::from(&crate::ServiceError::BadRequest("empty token".into()));
        assert_eq!(e.code, "bad_request");
        assert!(e.message.contains("empty token"));
    }

    #[test]
    fn health_response_serde() {
        let h = HealthResponse {
            status: "ok".into(),
            algorithms: vec!["aes-gcm".into()],
        };
        let json = serde_json::to_string(&h).unwrap();
        let decoded: HealthResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.algorithms, vec!["aes-gcm".to_string()]);
    }
}
