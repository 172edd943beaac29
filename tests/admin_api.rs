use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::connect_info::ConnectInfo;
use axum::extract::State;
use axum::middleware::from_fn_with_state;
use axum::routing::post;
use axum::{Extension, Json, Router};
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_cookies::CookieManagerLayer;
use zeroize::Zeroizing;

use backoffice::config::Config;
use backoffice::crypto::token;
use backoffice::error::AppError;
use backoffice::middleware_layer::auth::require_admin;
use backoffice::middleware_layer::rate_limit;
use backoffice::models::audit::{AuditAction, AuditLogEntry};
use backoffice::models::session::{Principal, SessionPayload};
use backoffice::net::ClientInfo;
use backoffice::repositories::admin::StaticAdminDirectory;
use backoffice::repositories::audit::AuditStore;
use backoffice::services::session::SESSION_TTL_SECS;
use backoffice::state::AppState;

const ADMIN_EMAIL: &str = "root@example.com";
const ADMIN_PASSWORD: &str = "correct horse battery staple";

fn test_config() -> Config {
    Config {
        session_secret: Zeroizing::new("integration-test-signing-secret".to_string()),
        admin_email: ADMIN_EMAIL.to_string(),
        admin_password: Zeroizing::new(ADMIN_PASSWORD.to_string()),
        admin_name: "Root".to_string(),
        allowlist: vec!["ops@example.com".to_string()],
        is_production: false,
        port: 4000,
    }
}

fn test_app() -> Router {
    backoffice::app(AppState::new(Arc::new(test_config())))
}

/// Sends one request through the router, with the peer address injected the
/// way `into_make_service_with_connect_info` would.
async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    ip: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> http::Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let mut request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::new(ip.parse().unwrap(), 40_000)));

    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// The `admin_token=...` pair from a login response, ready for a Cookie header.
fn session_cookie(response: &http::Response<Body>) -> String {
    set_cookie_header(response)
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

fn set_cookie_header(response: &http::Response<Body>) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("admin_token="))
        .expect("admin_token cookie missing from response")
        .to_string()
}

async fn login(app: &Router, ip: &str) -> http::Response<Body> {
    send(
        app,
        Method::POST,
        "/api/admin/login",
        ip,
        None,
        Some(json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD})),
    )
    .await
}

/// Signs a session token for an arbitrary email against the test secret.
fn mint_token(config: &Config, email: &str, ttl_secs: i64) -> String {
    let payload = SessionPayload::new(email, ttl_secs);
    token::encode(&payload, config.secret_bytes()).unwrap()
}

/// Polls the audit endpoint until `expected` entries are visible.
///
/// Capped at 25 polls per `poll_ip` to stay inside the listing's own
/// 30-per-minute window.
async fn wait_for_audit_entries(
    app: &Router,
    cookie: &str,
    poll_ip: &str,
    expected: usize,
) -> Vec<Value> {
    for _ in 0..25 {
        let response = send(
            app,
            Method::GET,
            "/api/admin/audit-logs",
            poll_ip,
            Some(cookie),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let entries = body_json(response).await;
        let entries = entries.as_array().expect("audit listing is an array").clone();
        if entries.len() >= expected {
            return entries;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("audit trail never reached {} entries", expected);
}

#[tokio::test]
async fn login_issues_a_hardened_session_cookie() {
    let app = test_app();

    let response = login(&app, "10.1.1.1").await;
    assert_eq!(response.status(), StatusCode::OK, "Login failed");

    let set_cookie = set_cookie_header(&response);
    assert!(set_cookie.contains("HttpOnly"), "cookie: {}", set_cookie);
    assert!(set_cookie.contains("SameSite=Lax"), "cookie: {}", set_cookie);
    assert!(set_cookie.contains("Path=/"), "cookie: {}", set_cookie);
    assert!(
        set_cookie.contains(&format!("Max-Age={}", SESSION_TTL_SECS)),
        "cookie: {}",
        set_cookie
    );
    // Development config: no Secure attribute.
    assert!(!set_cookie.contains("Secure"), "cookie: {}", set_cookie);

    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["name"], "Root");
}

#[tokio::test]
async fn wrong_credentials_are_rejected_identically() {
    let app = test_app();

    // Wrong password and wrong email must be indistinguishable.
    for payload in [
        json!({"email": ADMIN_EMAIL, "password": "wrong"}),
        json!({"email": "someone@example.com", "password": ADMIN_PASSWORD}),
        json!({"email": "", "password": ""}),
    ] {
        let response = send(
            &app,
            Method::POST,
            "/api/admin/login",
            "10.1.2.1",
            None,
            Some(payload),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({"error": "invalid_credentials"}));
    }
}

#[tokio::test]
async fn login_without_configured_credentials_is_missing_env() {
    let mut config = test_config();
    config.admin_password = Zeroizing::new(String::new());
    let state = AppState::new(Arc::new(config));
    let app = backoffice::app(state);

    let response = send(
        &app,
        Method::POST,
        "/api/admin/login",
        "10.1.3.1",
        None,
        Some(json!({"email": ADMIN_EMAIL, "password": "anything"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({"error": "missing_env"}));
}

#[tokio::test]
async fn login_rate_limit_locks_a_client_out_after_five_attempts() {
    let app = test_app();

    // Step 1: burn the 5-per-minute window with bad passwords.
    for _ in 0..5 {
        let response = send(
            &app,
            Method::POST,
            "/api/admin/login",
            "10.1.4.1",
            None,
            Some(json!({"email": ADMIN_EMAIL, "password": "wrong"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Step 2: the sixth attempt is rejected before credentials are read,
    // even when they are correct.
    let response = login(&app, "10.1.4.1").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await, json!({"error": "rate_limited"}));

    // Step 3: a different client address still has its own window.
    let response = login(&app, "10.1.4.2").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = test_app();

    let response = send(&app, Method::GET, "/api/admin/me", "10.1.5.1", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "unauthorized"}));
}

#[tokio::test]
async fn me_returns_the_verified_principal() {
    let app = test_app();

    let cookie = session_cookie(&login(&app, "10.1.6.1").await);
    let response = send(&app, Method::GET, "/api/admin/me", "10.1.6.1", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"email": ADMIN_EMAIL, "role": "superadmin"})
    );
}

#[tokio::test]
async fn tampered_cookie_gets_the_same_generic_rejection_as_no_cookie() {
    let app = test_app();

    let cookie = session_cookie(&login(&app, "10.1.7.1").await);
    // Flip the last character of the token.
    let mut tampered = cookie.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let with_tampered = send(
        &app,
        Method::GET,
        "/api/admin/me",
        "10.1.7.1",
        Some(&tampered),
        None,
    )
    .await;
    let without_cookie = send(&app, Method::GET, "/api/admin/me", "10.1.7.1", None, None).await;

    assert_eq!(with_tampered.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(without_cookie.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(with_tampered).await, body_json(without_cookie).await);
}

#[tokio::test]
async fn valid_signature_for_an_unknown_email_is_unauthorized() {
    let app = test_app();

    let token = mint_token(&test_config(), "ghost@example.com", SESSION_TTL_SECS);
    let cookie = format!("admin_token={}", token);
    let response = send(&app, Method::GET, "/api/admin/me", "10.1.8.1", Some(&cookie), None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "unauthorized"}));
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let app = test_app();

    let token = mint_token(&test_config(), ADMIN_EMAIL, -1);
    let cookie = format!("admin_token={}", token);
    let response = send(&app, Method::GET, "/api/admin/me", "10.1.9.1", Some(&cookie), None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "unauthorized"}));
}

#[tokio::test]
async fn logout_expires_the_cookie() {
    let app = test_app();

    let response = send(&app, Method::POST, "/api/admin/logout", "10.1.10.1", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = set_cookie_header(&response);
    assert!(set_cookie.starts_with("admin_token=;"), "cookie: {}", set_cookie);
    assert!(set_cookie.contains("Max-Age=0"), "cookie: {}", set_cookie);

    let body = body_json(response).await;
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn audit_trail_lists_logins_newest_first() {
    let app = test_app();

    // Step 1: first login, wait for its detached audit write to land.
    let cookie = session_cookie(&login(&app, "10.2.1.1").await);
    wait_for_audit_entries(&app, &cookie, "10.0.0.250", 1).await;

    // Step 2: second login from another address.
    login(&app, "10.2.1.2").await;
    let entries = wait_for_audit_entries(&app, &cookie, "10.0.0.251", 2).await;

    assert_eq!(entries[0]["action"], "login");
    assert_eq!(entries[0]["table_name"], "admins");
    assert_eq!(entries[0]["record_id"], ADMIN_EMAIL);
    assert_eq!(entries[0]["ip_address"], "10.2.1.2");
    assert_eq!(entries[1]["ip_address"], "10.2.1.1");
}

#[tokio::test]
async fn audit_trail_is_superadmin_only() {
    let app = test_app();

    // ops@example.com is allowlisted with the plain admin role; its session
    // verifies but the audit trail is out of its tier.
    let token = mint_token(&test_config(), "ops@example.com", SESSION_TTL_SECS);
    let cookie = format!("admin_token={}", token);

    let me = send(&app, Method::GET, "/api/admin/me", "10.2.2.1", Some(&cookie), None).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(
        body_json(me).await,
        json!({"email": "ops@example.com", "role": "admin"})
    );

    let trail = send(
        &app,
        Method::GET,
        "/api/admin/audit-logs",
        "10.2.2.1",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(trail.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(trail).await, json!({"error": "forbidden"}));
}

struct UnreachableAuditStore;

#[async_trait]
impl AuditStore for UnreachableAuditStore {
    async fn append(&self, _entry: AuditLogEntry) -> backoffice::error::Result<()> {
        Err(AppError::Internal("audit store unreachable".to_string()))
    }

    async fn recent(&self, _limit: usize) -> backoffice::error::Result<Vec<AuditLogEntry>> {
        Err(AppError::Internal("audit store unreachable".to_string()))
    }
}

#[tokio::test]
async fn audit_failure_does_not_change_the_login_response() {
    let config = Arc::new(test_config());
    let state = AppState::with_stores(
        config.clone(),
        Arc::new(StaticAdminDirectory::from_config(&config)),
        Arc::new(UnreachableAuditStore),
    );
    let app = backoffice::app(state);

    let response = login(&app, "10.3.1.1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({"ok": true, "name": "Root"}));

    // Let the detached write fail in the background; nothing should surface.
    tokio::time::sleep(Duration::from_millis(30)).await;
}

/// A CRUD-style handler mounted the way the marketplace routes consume this
/// crate: role gate via the middleware, admission via `enforce`, audit via
/// `record`.
async fn create_service(
    State(state): State<AppState>,
    client: ClientInfo,
    Extension(principal): Extension<Principal>,
    Json(body): Json<Value>,
) -> backoffice::error::Result<Json<Value>> {
    rate_limit::enforce(&state, &client, "services:create", 2, Duration::from_secs(60))?;
    state.audit.record(
        &client,
        AuditAction::Create,
        "services",
        Some("svc-1".to_string()),
        None::<&Value>,
        Some(&body),
    );
    tracing::debug!("service created by {}", principal.email);
    Ok(Json(json!({"ok": true})))
}

#[tokio::test]
async fn protection_layer_composes_around_external_handlers() {
    let state = AppState::new(Arc::new(test_config()));
    let app = Router::new()
        .route("/api/admin/services", post(create_service))
        .route_layer(from_fn_with_state(state.clone(), require_admin))
        .layer(CookieManagerLayer::new())
        .with_state(state.clone());

    // Unauthenticated requests never reach the handler.
    let response = send(&app, Method::POST, "/api/admin/services", "10.4.1.1", None, Some(json!({"title": "Deep clean"}))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = mint_token(&test_config(), ADMIN_EMAIL, SESSION_TTL_SECS);
    let cookie = format!("admin_token={}", token);

    // Two creations pass, the third trips the per-operation window.
    for _ in 0..2 {
        let response = send(
            &app,
            Method::POST,
            "/api/admin/services",
            "10.4.1.1",
            Some(&cookie),
            Some(json!({"title": "Deep clean"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = send(
        &app,
        Method::POST,
        "/api/admin/services",
        "10.4.1.1",
        Some(&cookie),
        Some(json!({"title": "Deep clean"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // The detached audit writes carry the serialized new state.
    for _ in 0..100 {
        let entries = state.audit.recent(10).await.unwrap();
        if entries.len() == 2 {
            assert_eq!(entries[0].action, AuditAction::Create);
            assert_eq!(entries[0].new_values.as_deref(), Some(r#"{"title":"Deep clean"}"#));
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("audit entries for the created services never landed");
}

#[tokio::test]
async fn cors_preflight_admits_the_dashboard_origin() {
    let app = test_app();

    let mut request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/admin/login")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::new("10.5.1.1".parse().unwrap(), 40_000)));

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
}
