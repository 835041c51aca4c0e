//! Audit log entity model and DTO.
//!
//! Audit logs are append-only and have no `updated_at` field.

use clientdesk_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A single audit log entry. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub details: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// DTO for inserting a new audit log entry. `details` must already be
/// redacted.
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub user_id: Option<DbId>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub details: Option<serde_json::Value>,
}
