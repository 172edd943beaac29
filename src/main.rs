use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backoffice::config::Config;
use backoffice::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Arc::new(Config::from_env()?);
    tracing::info!("✅ Configuration loaded successfully");

    let port = config.port;
    let state = AppState::new(config);
    tracing::info!("✅ AppState initialized");

    let app = backoffice::app(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("🚀 Admin API listening on http://{}", addr);
    tracing::info!("✅ All systems operational");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
