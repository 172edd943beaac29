use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tower_cookies::Cookies;

use crate::{
    error::{AppError, Result},
    models::audit::AuditAction,
    models::session::Principal,
    net::ClientInfo,
    services::session,
    state::AppState,
    validation::auth::{validate_email, validate_password},
};

/// The request payload for admin login.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The response payload for a successful login.
#[derive(Serialize)]
pub struct LoginResponse {
    pub ok: bool,
    pub name: String,
}

/// The generic acknowledgement payload.
#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Handles admin login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Admin login attempt: {} from {}", payload.email, client.ip);
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    let (expected_email, expected_password) = state
        .config
        .admin_credentials()
        .ok_or(AppError::MissingEnv)?;

    // Both comparisons always run so a wrong email costs the same as a
    // wrong password.
    let email_ok = payload.email.as_bytes().ct_eq(expected_email.as_bytes());
    let password_ok = payload
        .password
        .as_bytes()
        .ct_eq(expected_password.as_bytes());
    if !bool::from(email_ok & password_ok) {
        tracing::warn!("❌ Invalid admin credentials from {}", client.ip);
        return Err(AppError::InvalidCredentials);
    }

    let admin = state
        .admins
        .find_active(&payload.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    cookies.add(session::issue_cookie(&state.config, &admin.email)?);
    tracing::info!("✅ Admin session issued for {} from {}", admin.email, client.ip);

    state
        .audit
        .record_action(&client, AuditAction::Login, "admins", Some(admin.email.clone()));

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            ok: true,
            name: admin.name,
        }),
    )
        .into_response())
}

/// Handles admin logout.
///
/// Deliberately unauthenticated: clearing an absent or expired session is a
/// no-op success, so a client can always reset its cookie state.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    tracing::info!("👋 Admin logout");

    cookies.remove(session::clear_cookie(&state.config));

    Ok((StatusCode::OK, Json(OkResponse { ok: true })).into_response())
}

/// Returns the verified principal for the dashboard's boot check.
#[axum::debug_handler]
pub async fn me(Extension(principal): Extension<Principal>) -> Result<Response> {
    Ok((StatusCode::OK, Json(principal)).into_response())
}
