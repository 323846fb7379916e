//! Axum request handlers for all service endpoints.
//!
//! Key derivation costs tens of milliseconds, so every cipher call runs on the
//! blocking pool rather than an async worker. The request timeout cannot stop
//! a blocking call once started, so each call holds a permit from
//! [`AppState::cipher_permits`] until it returns, and tokens demanding more
//! than [`AppState::max_token_iterations`] are refused before dispatch.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{
    protocol::{
        DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, ErrorResponse,
        HealthResponse, VerifyRequest, VerifyResponse,
    },
    ServiceError,
};
use std::sync::Arc;

use pwcrypt::{Algorithm, CipherError, ErrorKind, Token};
use tokio::sync::Semaphore;
use tracing::{error, warn};

use super::state::AppState;

/// `POST /encrypt`: issue a token for the submitted secret.
pub async fn encrypt(
    State(state): State<AppState>,
    Json(req): Json<EncryptRequest>,
) -> Response {
    let cipher = state.cipher.clone();
    let work = move || cipher.encrypt(&req.plaintext);
    match run_blocking(&state.cipher_permits, "encrypt", work).await {
        Ok(token) => (StatusCode::OK, Json(EncryptResponse { token })).into_response(),
        Err(err) => error_response(&err),
    }
}

/// `POST /decrypt`: recover the secret held in a token.
pub async fn decrypt(
    State(state): State<AppState>,
    Json(req): Json<DecryptRequest>,
) -> Response {
    if let Err(err) = check_work_factor("decrypt", &req.token, state.max_token_iterations) {
        return error_response(&err);
    }
    let cipher = state.cipher.clone();
    let work = move || cipher.decrypt(&req.token);
    match run_blocking(&state.cipher_permits, "decrypt", work).await {
        Ok(plaintext) => (StatusCode::OK, Json(DecryptResponse { plaintext })).into_response(),
        Err(err) => error_response(&err),
    }
}

/// `POST /verify`: compare a candidate secret with a token.
///
/// A mismatch is `200 {"valid": false}`; a token that cannot be opened is an
/// error, same as `/decrypt`.
pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Response {
    if let Err(err) = check_work_factor("verify", &req.token, state.max_token_iterations) {
        return error_response(&err);
    }
    let cipher = state.cipher.clone();
    let work = move || cipher.verify(&req.plaintext, &req.token);
    match run_blocking(&state.cipher_permits, "verify", work).await {
        Ok(valid) => (StatusCode::OK, Json(VerifyResponse { valid })).into_response(),
        Err(err) => error_response(&err),
    }
}

/// `GET /health`: liveness check.
///
/// The master key is validated before the listener binds, so a running
/// server is always ready.
pub async fn health() -> Response {
    let body = HealthResponse {
        status: "ok".into(),
        algorithms: Algorithm::ALL.iter().map(|a| a.name().to_owned()).collect(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

/// Refuse tokens whose work factor exceeds `max_iterations`.
///
/// Tokens that do not parse are left for the cipher to reject, so the error
/// body matches what `/decrypt` reports for them.
fn check_work_factor(
    op: &'static str,
    token: &str,
    max_iterations: u32,
) -> Result<(), ServiceError> {
    match Token::parse(token.trim()) {
        Ok(parsed) if parsed.iterations > max_iterations => {
            warn!(
                op,
                iterations = parsed.iterations,
                max_iterations,
                "token work factor over limit"
            );
            Err(ServiceError::BadRequest(format!(
                "token work factor {} exceeds the limit of {max_iterations}",
                parsed.iterations
            )))
        }
        _ => Ok(()),
    }
}

/// Run `f` on the blocking pool while holding one of `permits`.
///
/// The permit moves into the blocking closure, so it stays taken until `f`
/// returns even if the awaiting request is dropped by the timeout layer.
async fn run_blocking<T, F>(
    permits: &Arc<Semaphore>,
    op: &'static str,
    f: F,
) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, CipherError> + Send + 'static,
    T: Send + 'static,
{
    let permit = match permits.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(err) => {
            error!(op, error = %err, "cipher permits closed");
            return Err(ServiceError::Internal(format!("{op} failed")));
        }
    };

    let task = move || {
        let _permit = permit;
        f()
    };

    match tokio::task::spawn_blocking(task).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(classify(op, &err)),
        Err(join_err) => {
            error!(op, error = %join_err, "cipher task failed");
            Err(ServiceError::Internal(format!("{op} failed")))
        }
    }
}

/// Map a cipher failure onto the HTTP error surface.
///
/// Cipher error messages carry lengths and algorithm names only, never input
/// bytes, so they are safe to log and return. Internal failures are logged
/// in full but reported generically.
fn classify(op: &'static str, err: &CipherError) -> ServiceError {
    match err.kind() {
        ErrorKind::InvalidInput | ErrorKind::Format | ErrorKind::UnsupportedAlgorithm => {
            warn!(op, error = %err, "rejected request");
            ServiceError::BadRequest(err.to_string())
        }
        ErrorKind::Authentication => {
            warn!(op, error = %err, "token failed authentication");
            ServiceError::AuthenticationFailed(err.to_string())
        }
        ErrorKind::Internal => {
            error!(op, error = %err, "cipher failure");
            ServiceError::Internal(format!("{op} failed"))
        }
    }
}

fn error_response(err: &ServiceError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err))).into_response()
}
