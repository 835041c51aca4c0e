//! Repository for the append-only `audit_logs` table.

use clientdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::audit::{AuditLog, CreateAuditLog};

/// Column list for `audit_logs` SELECT queries.
const COLUMNS: &str = "id, user_id, action, entity_type, entity_id, details, created_at";

pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Insert a single entry, returning the stored row.
    pub async fn insert(pool: &PgPool, entry: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs (user_id, action, entity_type, entity_id, details)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(entry.user_id)
            .bind(&entry.action)
            .bind(&entry.entity_type)
            .bind(entry.entity_id)
            .bind(&entry.details)
            .fetch_one(pool)
            .await
    }

    /// Entries for one entity, newest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs
             WHERE entity_type = $1 AND entity_id = $2
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }
}
