use tower_cookies::cookie::SameSite;
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};

use crate::config::Config;
use crate::crypto::token;
use crate::error::{AppError, Result};
use crate::models::admin::AdminRole;
use crate::models::session::{Principal, SessionPayload};
use crate::state::AppState;

/// Name of the admin session cookie.
pub const SESSION_COOKIE: &str = "admin_token";
/// Session lifetime in seconds (24 hours).
pub const SESSION_TTL_SECS: i64 = 86_400;

/// Builds the signed session cookie for a freshly authenticated admin.
///
/// # Arguments
///
/// * `config` - Application configuration; supplies the signing secret and
///   whether the `Secure` flag applies.
/// * `email` - The authenticated admin's email.
///
/// # Returns
///
/// A `Result` containing the cookie to add to the response.
pub fn issue_cookie(config: &Config, email: &str) -> Result<Cookie<'static>> {
    let payload = SessionPayload::new(email, SESSION_TTL_SECS);
    let token = token::encode(&payload, config.secret_bytes())?;

    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    if config.is_production {
        cookie.set_secure(true);
    }
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(Duration::seconds(SESSION_TTL_SECS));
    cookie.set_path("/");

    Ok(cookie)
}

/// Builds the expiring cookie that terminates a session on logout.
pub fn clear_cookie(config: &Config) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_http_only(true);
    if config.is_production {
        cookie.set_secure(true);
    }
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(Duration::seconds(0));
    cookie.set_path("/");

    cookie
}

/// Verifies the session cookie on a request and resolves its principal.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request's cookie jar.
///
/// # Returns
///
/// A `Result` containing the authenticated `Principal`.
pub async fn verify(state: &AppState, cookies: &Cookies) -> Result<Principal> {
    let token = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string());
    verify_token(state, token.as_deref()).await
}

/// Token-level verification: decode, then gate on the admin directory.
///
/// Every rejection collapses to the same generic unauthorized response at
/// the edge; the real cause is only logged. A directory error also rejects,
/// never letting a broken lookup admit a request.
pub async fn verify_token(state: &AppState, token: Option<&str>) -> Result<Principal> {
    let token = token.ok_or(AppError::NoToken)?;
    let payload = token::decode(token, state.config.secret_bytes())?;

    let admin = match state.admins.find_active(&payload.email).await {
        Ok(Some(admin)) => admin,
        Ok(None) => {
            tracing::warn!("❌ Valid session token for unknown or inactive admin: {}", payload.email);
            return Err(AppError::Unauthorized);
        }
        Err(e) => {
            tracing::warn!("❌ Admin directory lookup failed, rejecting session: {}", e);
            return Err(AppError::Unauthorized);
        }
    };

    // Best-effort bookkeeping; a failure here must not fail the request.
    if let Err(e) = state.admins.touch_last_seen(&admin.email).await {
        tracing::debug!("Failed to touch last_seen for {}: {}", admin.email, e);
    }

    tracing::debug!("🔐 Session verified for admin: {}", admin.email);
    Ok(Principal {
        email: admin.email,
        role: admin.role,
    })
}

/// Requires the principal to hold at least the given role.
pub fn require_role(principal: &Principal, required: AdminRole) -> Result<()> {
    if principal.role.satisfies(required) {
        Ok(())
    } else {
        tracing::warn!(
            "❌ Admin {} lacks required role {:?}",
            principal.email,
            required
        );
        Err(AppError::Forbidden)
    }
}
