use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::crypto::token::TokenError;

/// The application's error type.
///
/// Every session or token failure is normalized to a generic
/// `401 {"error":"unauthorized"}` body; the precise reason is logged for
/// operators but never leaked to the client.
#[derive(Error, Debug)]
pub enum AppError {
    /// No session cookie was presented.
    #[error("no session token presented")]
    NoToken,

    /// The presented session token failed an integrity check.
    #[error("session token rejected: {0}")]
    Token(#[from] TokenError),

    /// The token was valid but the identity is unknown or inactive.
    #[error("unknown or inactive admin identity")]
    Unauthorized,

    /// The identity is valid but its role does not cover the operation.
    #[error("insufficient role for this operation")]
    Forbidden,

    /// Login credentials did not match the configured administrator.
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// A sliding-window rate limit rejected the request.
    #[error("rate limit exceeded for operation `{0}`")]
    RateLimited(String),

    /// The server is missing its admin credential configuration.
    #[error("admin credentials are not configured")]
    MissingEnv,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NoToken => {
                tracing::debug!("❌ No session token on a protected request");
                (StatusCode::UNAUTHORIZED, "unauthorized".to_string())
            }

            AppError::Token(ref e) => {
                tracing::warn!("❌ Session token rejected: {}", e);
                (StatusCode::UNAUTHORIZED, "unauthorized".to_string())
            }

            AppError::Unauthorized => {
                tracing::warn!("❌ Valid token for an unknown or inactive admin");
                (StatusCode::UNAUTHORIZED, "unauthorized".to_string())
            }

            AppError::Forbidden => {
                tracing::warn!("❌ Role check failed");
                (StatusCode::FORBIDDEN, "forbidden".to_string())
            }

            AppError::InvalidCredentials => {
                tracing::warn!("❌ Login rejected: credentials mismatch");
                (StatusCode::UNAUTHORIZED, "invalid_credentials".to_string())
            }

            AppError::RateLimited(ref op) => {
                tracing::warn!("❌ Rate limit exceeded: {}", op);
                (StatusCode::TOO_MANY_REQUESTS, "rate_limited".to_string())
            }

            AppError::MissingEnv => {
                tracing::error!("❌ Admin credentials are not configured");
                (StatusCode::INTERNAL_SERVER_ERROR, "missing_env".to_string())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"internal"}"#.to_string());

        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}
