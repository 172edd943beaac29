use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::admin::AdminRole;

/// The claim carried inside a signed session token.
///
/// `expires_at` is always set by the issuer; a token whose payload lacks the
/// field never deserializes and is therefore never valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    /// The authenticated administrator email.
    pub email: String,
    /// Expiry as unix milliseconds (the original cookie's wire name).
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
}

impl SessionPayload {
    /// Builds a payload expiring `ttl_secs` from now.
    pub fn new(email: impl Into<String>, ttl_secs: i64) -> Self {
        Self {
            email: email.into(),
            expires_at: Utc::now().timestamp_millis() + ttl_secs * 1_000,
        }
    }
}

/// The verified identity produced by a successful session check.
///
/// Constructed only by verification, carried as a request extension, never
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    /// The verified administrator email.
    pub email: String,
    /// The role the admin directory associates with this email.
    pub role: AdminRole,
}
