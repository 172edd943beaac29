use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of privileged action an audit entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Download,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Login => "login",
            AuditAction::Download => "download",
        };
        f.write_str(s)
    }
}

/// One immutable record of "who did what to which record".
///
/// Appended to the audit sink after the mutation it describes completed;
/// never updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique identifier of the entry itself.
    pub id: Uuid,
    /// The privileged action performed.
    pub action: AuditAction,
    /// The logical table/collection the action touched.
    pub table_name: String,
    /// The affected record's identifier, when the action targets one.
    pub record_id: Option<String>,
    /// Serialized snapshot of the record before the mutation.
    pub old_values: Option<String>,
    /// Serialized snapshot of the record after the mutation.
    pub new_values: Option<String>,
    /// The resolved client address of the request.
    pub ip_address: String,
    /// The request's User-Agent header, when present.
    pub user_agent: Option<String>,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_serialize_lowercase() {
        assert_eq!(sonic_rs::to_string(&AuditAction::Login).unwrap(), r#""login""#);
        assert_eq!(sonic_rs::to_string(&AuditAction::Delete).unwrap(), r#""delete""#);
    }

    #[test]
    fn action_display_matches_wire_form() {
        assert_eq!(AuditAction::Download.to_string(), "download");
        assert_eq!(AuditAction::Create.to_string(), "create");
    }
}
