//! Fire-and-forget audit logging.
//!
//! Each event is written on its own task so a slow or failing insert never
//! delays or fails the request that produced it.

use clientdesk_core::audit::redact_sensitive_fields;
use clientdesk_core::types::DbId;
use clientdesk_db::models::audit::CreateAuditLog;
use clientdesk_db::repositories::AuditLogRepo;
use clientdesk_db::DbPool;
use serde::Serialize;
use tokio::task::JoinHandle;

/// A single auditable action.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub user_id: Option<DbId>,
    pub action: &'static str,
    pub entity_type: Option<&'static str>,
    pub entity_id: Option<DbId>,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    /// An action performed by `user_id` on one entity.
    pub fn entity(
        action: &'static str,
        entity_type: &'static str,
        entity_id: DbId,
        user_id: DbId,
    ) -> Self {
        Self {
            user_id: Some(user_id),
            action,
            entity_type: Some(entity_type),
            entity_id: Some(entity_id),
            details: None,
        }
    }

    /// Attach a payload. Values that fail to serialize are dropped.
    pub fn with_details(mut self, details: &impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }
}

#[derive(Clone)]
pub struct AuditSink {
    pool: DbPool,
}

impl AuditSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Queue an event for insertion. Sensitive keys in the payload are
    /// redacted before the task is spawned.
    pub fn record(&self, event: AuditEvent) -> JoinHandle<()> {
        let pool = self.pool.clone();
        let entry = CreateAuditLog {
            user_id: event.user_id,
            action: event.action.to_string(),
            entity_type: event.entity_type.map(str::to_string),
            entity_id: event.entity_id,
            details: event.details.as_ref().map(redact_sensitive_fields),
        };

        tokio::spawn(async move {
            if let Err(e) = AuditLogRepo::insert(&pool, &entry).await {
                tracing::warn!(
                    error = %e,
                    action = %entry.action,
                    entity_id = ?entry.entity_id,
                    "Failed to write audit log entry",
                );
            }
        })
    }
}
