use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::config::Config;
use crate::error::Result;
use crate::models::admin::{AdminRecord, AdminRole};

/// Lookup of back-office operators by email.
///
/// Session verification treats every failure here as fatal for the request:
/// an email that is unknown or inactive yields no principal, and a directory
/// error is never surfaced as anything more specific than unauthorized.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// Finds an admin by exact (case-sensitive) email, active records only.
    async fn find_active(&self, email: &str) -> Result<Option<AdminRecord>>;

    /// Records that the admin was just seen. Best-effort bookkeeping; callers
    /// may ignore the result.
    async fn touch_last_seen(&self, email: &str) -> Result<()>;
}

/// Directory populated from the environment-configured admin set.
///
/// The primary credentialed admin gets the `superadmin` role; allowlisted
/// emails get `admin`. Nothing here persists across restarts.
pub struct StaticAdminDirectory {
    admins: RwLock<HashMap<String, AdminRecord>>,
}

impl StaticAdminDirectory {
    pub fn from_config(config: &Config) -> Self {
        let mut admins = HashMap::new();
        admins.insert(
            config.admin_email.clone(),
            AdminRecord {
                email: config.admin_email.clone(),
                name: config.admin_name.clone(),
                role: AdminRole::SuperAdmin,
                is_active: true,
                last_seen_at: None,
            },
        );

        for email in &config.allowlist {
            if email == &config.admin_email {
                continue;
            }
            admins.insert(
                email.clone(),
                AdminRecord {
                    email: email.clone(),
                    name: display_name_for(email),
                    role: AdminRole::Admin,
                    is_active: true,
                    last_seen_at: None,
                },
            );
        }

        Self {
            admins: RwLock::new(admins),
        }
    }

    /// Number of operators the directory was seeded with.
    pub fn admin_count(&self) -> usize {
        self.admins.read().len()
    }
}

/// Default display name for an allowlisted admin: the email's local part.
fn display_name_for(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[async_trait]
impl AdminDirectory for StaticAdminDirectory {
    async fn find_active(&self, email: &str) -> Result<Option<AdminRecord>> {
        let admins = self.admins.read();
        Ok(admins.get(email).filter(|a| a.is_active).cloned())
    }

    async fn touch_last_seen(&self, email: &str) -> Result<()> {
        let mut admins = self.admins.write();
        if let Some(admin) = admins.get_mut(email) {
            admin.last_seen_at = Some(Utc::now());
        }
        Ok(())
    }
}
