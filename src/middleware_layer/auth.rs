use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    error::Result,
    services::session,
    state::AppState,
};

/// A middleware that requires a valid admin session.
///
/// On success the resolved `Principal` is inserted into the request
/// extensions for handlers to read. Any rejection short-circuits with the
/// generic unauthorized response.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response` or an error `AppError`.
pub async fn require_admin(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    tracing::debug!("🔐 Checking admin session...");

    let principal = session::verify(&state, &cookies).await?;

    tracing::debug!("✅ Admin authenticated: {}", principal.email);
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}
