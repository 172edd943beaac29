use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::{AppError, Result},
    net::ClientInfo,
    state::AppState,
};

/// Login attempts allowed per client per window.
pub const LOGIN_RATE_LIMIT: usize = 5;
/// The login rate-limit window.
pub const LOGIN_RATE_WINDOW: Duration = Duration::from_secs(60);

/// Checks a sliding-window limit for one operation, recording the hit.
///
/// Handlers call this for operations that are limited after authentication;
/// the login middleware uses it pre-auth. Rejections carry the operation
/// name for the log only, the response body stays generic.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `client` - The resolved client identity.
/// * `operation` - Logical name of the guarded operation.
/// * `limit` - Maximum admitted requests per window.
/// * `window` - Trailing window length.
pub fn enforce(
    state: &AppState,
    client: &ClientInfo,
    operation: &str,
    limit: usize,
    window: Duration,
) -> Result<()> {
    if state.limiter.admit(operation, &client.ip, limit, window) {
        Ok(())
    } else {
        tracing::warn!("❌ Rate limit exceeded: {} from {}", operation, client.ip);
        Err(AppError::RateLimited(operation.to_string()))
    }
}

/// A middleware that rate limits login attempts per client address.
///
/// Runs before credentials are checked, so a flood of bad passwords burns
/// the window without ever reaching the comparison.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `client` - The resolved client identity.
/// * `req` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response` or an error `AppError`.
pub async fn rate_limit_login(
    State(state): State<AppState>,
    client: ClientInfo,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Err(e) = enforce(&state, &client, "login", LOGIN_RATE_LIMIT, LOGIN_RATE_WINDOW) {
        return e.into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use zeroize::Zeroizing;

    use crate::config::Config;

    fn test_state() -> AppState {
        AppState::new(Arc::new(Config {
            session_secret: Zeroizing::new("secret".to_string()),
            admin_email: "root@example.com".to_string(),
            admin_password: Zeroizing::new("password".to_string()),
            admin_name: "Root".to_string(),
            allowlist: Vec::new(),
            is_production: false,
            port: 4000,
        }))
    }

    fn client(ip: &str) -> ClientInfo {
        ClientInfo {
            ip: ip.to_string(),
            user_agent: None,
        }
    }

    #[test]
    fn enforce_rejects_once_the_window_is_full() {
        let state = test_state();
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            assert!(enforce(&state, &client("10.0.0.1"), "export", 3, window).is_ok());
        }
        let err = enforce(&state, &client("10.0.0.1"), "export", 3, window).unwrap_err();
        assert!(matches!(err, AppError::RateLimited(_)));

        // A different client has its own window.
        assert!(enforce(&state, &client("10.0.0.2"), "export", 3, window).is_ok());
    }
}
