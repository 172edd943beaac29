use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::models::session::SessionPayload;

type HmacSha256 = Hmac<Sha256>;

/// Why a presented session token was rejected.
///
/// Callers must not leak which variant occurred to the client; every variant
/// maps to the same generic unauthorized response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token does not have the payload.signature shape")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token payload is not a valid session document")]
    Unparseable,
    #[error("token has expired")]
    Expired,
}

/// Encodes and signs a session payload into a cookie-safe token.
///
/// The token is `base64url(JSON payload) + "." + base64url(HMAC-SHA256)`
/// where the MAC is computed over the encoded payload segment, so any
/// modification of the ciphertext-visible text invalidates the signature.
///
/// # Arguments
///
/// * `payload` - The session claims to embed.
/// * `secret` - The signing secret.
///
/// # Returns
///
/// The signed token string.
pub fn encode(payload: &SessionPayload, secret: &[u8]) -> Result<String> {
    let json = sonic_rs::to_string(payload)
        .map_err(|e| AppError::Internal(format!("Failed to serialize session payload: {}", e)))?;
    let encoded_payload = general_purpose::URL_SAFE_NO_PAD.encode(json.as_bytes());

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(format!("Failed to initialize HMAC: {}", e)))?;
    mac.update(encoded_payload.as_bytes());
    let signature = general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", encoded_payload, signature))
}

/// Verifies a presented token and recovers its session payload.
///
/// Checks run strictly in order: shape, then signature, then payload
/// structure, then expiry. The signature is checked before the payload is
/// parsed, so unsigned garbage never reaches the JSON parser, and the
/// comparison is constant-time.
///
/// # Arguments
///
/// * `token` - The raw token string, as read from the cookie.
/// * `secret` - The signing secret the token must verify against.
///
/// # Returns
///
/// The embedded payload, or the first check that failed.
pub fn decode(token: &str, secret: &[u8]) -> std::result::Result<SessionPayload, TokenError> {
    let mut segments = token.split('.');
    let (encoded_payload, encoded_signature) = match (segments.next(), segments.next(), segments.next()) {
        (Some(payload), Some(signature), None) if !payload.is_empty() && !signature.is_empty() => {
            (payload, signature)
        }
        _ => return Err(TokenError::Malformed),
    };

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| TokenError::BadSignature)?;
    mac.update(encoded_payload.as_bytes());
    let expected = mac.finalize().into_bytes();

    let presented = general_purpose::URL_SAFE_NO_PAD
        .decode(encoded_signature)
        .map_err(|_| TokenError::BadSignature)?;
    if !bool::from(expected.ct_eq(presented.as_slice())) {
        return Err(TokenError::BadSignature);
    }

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(encoded_payload)
        .map_err(|_| TokenError::Unparseable)?;
    let payload: SessionPayload =
        sonic_rs::from_slice(&payload_bytes).map_err(|_| TokenError::Unparseable)?;

    if payload.expires_at <= Utc::now().timestamp_millis() {
        return Err(TokenError::Expired);
    }

    Ok(payload)
}
