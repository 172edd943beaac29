use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;
use crate::models::audit::AuditLogEntry;

/// How many entries the in-memory store retains before evicting the oldest.
pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

/// Append-only sink for audit entries.
///
/// Writes happen on detached tasks after the audited action already
/// succeeded, so implementations must never be able to fail that action;
/// an `Err` here is logged and dropped by the recorder.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Appends one entry.
    async fn append(&self, entry: AuditLogEntry) -> Result<()>;

    /// Returns up to `limit` entries, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>>;
}

/// Bounded in-memory audit store.
///
/// Keeps the most recent `capacity` entries in a ring; the oldest entries are
/// evicted as new ones arrive.
pub struct InMemoryAuditStore {
    entries: Mutex<VecDeque<AuditLogEntry>>,
    capacity: usize,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
        }
    }
}

impl Default for InMemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, entry: AuditLogEntry) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>> {
        let entries = self.entries.lock();
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }
}
