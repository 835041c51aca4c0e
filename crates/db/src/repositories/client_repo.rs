//! Repository for the `clients` table.

use clientdesk_core::listing::{FilterKind, SortDirection};
use clientdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::client::{self, Client, ClientRow, CreateClient, UpdateClient};
use crate::provider::{FilterColumn, Provider, ProviderConfig, SortColumn};

pub static CLIENT_PROVIDER: Provider<ClientRow, Client> = Provider::new(ProviderConfig {
    entity: "Client",
    table: "clients",
    select: "c.id, c.name, c.email, c.phone, c.external_id, c.industry_id, c.is_active, \
             c.created_at, c.updated_at, i.name AS industry_name, \
             (SELECT COUNT(*) FROM contracts ct WHERE ct.client_id = c.id) AS contract_count",
    from: "clients c LEFT JOIN industries i ON i.id = c.industry_id",
    id_column: "c.id",
    search_columns: &["c.name", "c.email", "c.external_id"],
    filters: &[
        FilterColumn::eq("industryId", "c.industry_id", FilterKind::Id),
        FilterColumn::eq("isActive", "c.is_active", FilterKind::Bool),
    ],
    sort_columns: &[
        SortColumn::new("name", "c.name"),
        SortColumn::new("email", "c.email"),
        SortColumn::new("isActive", "c.is_active"),
        SortColumn::new("createdAt", "c.created_at"),
        SortColumn::new("updatedAt", "c.updated_at"),
    ],
    default_sort: ("name", SortDirection::Asc),
    transform: client::transform,
});

/// Create and update for clients; list/get/delete go through
/// [`CLIENT_PROVIDER`].
pub struct ClientRepo;

impl ClientRepo {
    /// Insert a client and return it as a model.
    pub async fn create(pool: &PgPool, input: &CreateClient) -> Result<Client, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO clients (name, email, phone, external_id, industry_id, is_active)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, true))
             RETURNING id",
        )
        .bind(input.name.trim())
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.external_id)
        .bind(input.industry_id)
        .bind(input.is_active)
        .fetch_one(pool)
        .await?;

        CLIENT_PROVIDER.get(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Partial update. Returns `None` if no row with `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateClient,
    ) -> Result<Option<Client>, sqlx::Error> {
        let updated: Option<DbId> = sqlx::query_scalar(
            "UPDATE clients SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                external_id = COALESCE($5, external_id),
                industry_id = COALESCE($6, industry_id),
                is_active = COALESCE($7, is_active)
             WHERE id = $1
             RETURNING id",
        )
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.external_id)
        .bind(input.industry_id)
        .bind(input.is_active)
        .fetch_optional(pool)
        .await?;

        match updated {
            Some(id) => CLIENT_PROVIDER.get(pool, id).await,
            None => Ok(None),
        }
    }
}
