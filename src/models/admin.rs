use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role tier an admin identity holds.
///
/// Variant order matters: a later variant satisfies every earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    /// Back-office operator from the allow-list.
    Admin,
    /// The single configured administrator.
    SuperAdmin,
}

impl AdminRole {
    /// Whether this role covers an operation requiring `required`.
    pub fn satisfies(self, required: AdminRole) -> bool {
        self >= required
    }
}

/// An entry in the admin directory.
///
/// The single-admin deployment keeps these in configuration; store-backed
/// deployments expose the same shape through the directory trait.
#[derive(Debug, Clone, Serialize)]
pub struct AdminRecord {
    /// The admin's email, the identity the session payload must match.
    pub email: String,
    /// The admin's display name.
    pub name: String,
    /// The role tier granted to this admin.
    pub role: AdminRole,
    /// Whether the admin may authenticate at all.
    pub is_active: bool,
    /// The timestamp of the admin's last verified request.
    pub last_seen_at: Option<DateTime<Utc>>,
}
