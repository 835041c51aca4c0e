//! Repository for the `roles` table.

use clientdesk_core::listing::SortDirection;
use clientdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::role::{self, CreateRole, Role, RoleRow, UpdateRole};
use crate::provider::{Provider, ProviderConfig, SortColumn};

pub static ROLE_PROVIDER: Provider<RoleRow, Role> = Provider::new(ProviderConfig {
    entity: "Role",
    table: "roles",
    select: "r.id, r.name, r.description, r.permissions, r.created_at, r.updated_at, \
             (SELECT COUNT(*) FROM users u WHERE u.role_id = r.id) AS user_count",
    from: "roles r",
    id_column: "r.id",
    search_columns: &["r.name", "r.description"],
    filters: &[],
    sort_columns: &[
        SortColumn::new("name", "r.name"),
        SortColumn::new("createdAt", "r.created_at"),
    ],
    default_sort: ("name", SortDirection::Asc),
    transform: role::transform,
});

pub struct RoleRepo;

impl RoleRepo {
    pub async fn create(pool: &PgPool, input: &CreateRole) -> Result<Role, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO roles (name, description, permissions)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(&input.permissions)
        .fetch_one(pool)
        .await?;

        ROLE_PROVIDER.get(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRole,
    ) -> Result<Option<Role>, sqlx::Error> {
        let updated: Option<DbId> = sqlx::query_scalar(
            "UPDATE roles SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                permissions = COALESCE($4, permissions)
             WHERE id = $1
             RETURNING id",
        )
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.description)
        .bind(&input.permissions)
        .fetch_optional(pool)
        .await?;

        match updated {
            Some(id) => ROLE_PROVIDER.get(pool, id).await,
            None => Ok(None),
        }
    }
}
