use std::sync::Arc;

use crate::config::Config;
use crate::rate_limit::RateLimiter;
use crate::repositories::admin::{AdminDirectory, StaticAdminDirectory};
use crate::repositories::audit::{AuditStore, InMemoryAuditStore};
use crate::services::audit::AuditRecorder;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<Config>,
    /// Sliding-window limiter shared by every guarded operation.
    pub limiter: RateLimiter,
    /// The admin directory consulted on every verified request.
    pub admins: Arc<dyn AdminDirectory>,
    /// The fire-and-forget audit recorder.
    pub audit: AuditRecorder,
}

impl AppState {
    /// Creates the state with the default in-process stores.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    pub fn new(config: Arc<Config>) -> Self {
        let directory = StaticAdminDirectory::from_config(&config);
        tracing::info!("✅ Admin directory initialized ({} operators)", directory.admin_count());

        let limiter = RateLimiter::new();
        tracing::info!("✅ RateLimiter initialized (sliding window)");

        let audit = AuditRecorder::new(Arc::new(InMemoryAuditStore::new()));
        tracing::info!("✅ Audit recorder initialized (in-memory store)");

        Self {
            config,
            limiter,
            admins: Arc::new(directory),
            audit,
        }
    }

    /// Creates the state with caller-supplied stores.
    ///
    /// Store-backed deployments (and tests) plug their own `AdminDirectory`
    /// and `AuditStore` implementations in here.
    pub fn with_stores(
        config: Arc<Config>,
        admins: Arc<dyn AdminDirectory>,
        audit_store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            config,
            limiter: RateLimiter::new(),
            admins,
            audit: AuditRecorder::new(audit_store),
        }
    }
}
