use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::models::audit::{AuditAction, AuditLogEntry};
use crate::net::ClientInfo;
use crate::repositories::audit::AuditStore;

/// Fire-and-forget recorder for privileged actions.
///
/// `record` builds the entry synchronously, then hands the write to a
/// detached task. The audited operation has already succeeded by the time
/// recording starts, so a failed or slow write never affects its response;
/// failures are logged and dropped.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Records an action with optional before/after snapshots.
    ///
    /// # Arguments
    ///
    /// * `client` - The acting client's resolved address and User-Agent.
    /// * `action` - The action performed.
    /// * `table_name` - Logical table the action touched.
    /// * `record_id` - The affected record, when the action targets one.
    /// * `old` - State before the mutation, serialized into the entry.
    /// * `new` - State after the mutation, serialized into the entry.
    pub fn record<O: Serialize, N: Serialize>(
        &self,
        client: &ClientInfo,
        action: AuditAction,
        table_name: &str,
        record_id: Option<String>,
        old: Option<&O>,
        new: Option<&N>,
    ) {
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            action,
            table_name: table_name.to_string(),
            record_id,
            old_values: old.and_then(serialize_snapshot),
            new_values: new.and_then(serialize_snapshot),
            ip_address: client.ip.clone(),
            user_agent: client.user_agent.clone(),
            created_at: Utc::now(),
        };

        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.append(entry).await {
                tracing::warn!("❌ Audit write failed, entry dropped: {}", e);
            }
        });
    }

    /// Records an action that has no before/after snapshots, e.g. a login.
    pub fn record_action(
        &self,
        client: &ClientInfo,
        action: AuditAction,
        table_name: &str,
        record_id: Option<String>,
    ) {
        self.record::<(), ()>(client, action, table_name, record_id, None, None);
    }

    /// Returns up to `limit` recorded entries, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>> {
        self.store.recent(limit).await
    }
}

/// Serializes a snapshot, or drops it with a warning if it will not encode.
fn serialize_snapshot<T: Serialize>(value: &T) -> Option<String> {
    match sonic_rs::to_string(value) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::warn!("❌ Audit snapshot failed to serialize, omitted: {}", e);
            None
        }
    }
}
