use std::time::Duration;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    error::Result,
    middleware_layer::rate_limit,
    models::admin::AdminRole,
    models::session::Principal,
    net::ClientInfo,
    services::session,
    state::AppState,
};

/// Default number of entries returned by a listing.
const DEFAULT_LIMIT: usize = 50;
/// Largest number of entries a single listing may request.
const MAX_LIMIT: usize = 200;
/// Listings allowed per client per window.
const LIST_RATE_LIMIT: usize = 30;
/// The listing rate-limit window.
const LIST_RATE_WINDOW: Duration = Duration::from_secs(60);

/// Query parameters for the audit-trail listing.
#[derive(Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<usize>,
}

/// Lists recent audit entries, newest first. Superadmin only.
#[axum::debug_handler]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    client: ClientInfo,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Response> {
    session::require_role(&principal, AdminRole::SuperAdmin)?;
    rate_limit::enforce(&state, &client, "audit-logs:list", LIST_RATE_LIMIT, LIST_RATE_WINDOW)?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let entries = state.audit.recent(limit).await?;

    tracing::debug!("📋 Returning {} audit entries to {}", entries.len(), principal.email);
    Ok((StatusCode::OK, Json(entries)).into_response())
}
