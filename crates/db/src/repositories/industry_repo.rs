//! Repository for the `industries` tree.

use clientdesk_core::listing::{FilterKind, SortDirection};
use clientdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::industry::{self, CreateIndustry, Industry, IndustryRow, UpdateIndustry};
use crate::provider::{FilterColumn, Provider, ProviderConfig, SortColumn};

pub static INDUSTRY_PROVIDER: Provider<IndustryRow, Industry> = Provider::new(ProviderConfig {
    entity: "Industry",
    table: "industries",
    select: "i.id, i.name, i.external_id, i.description, i.parent_id, i.created_at, \
             i.updated_at, p.name AS parent_name, \
             (SELECT COUNT(*) FROM industries ch WHERE ch.parent_id = i.id) AS children_count",
    from: "industries i LEFT JOIN industries p ON p.id = i.parent_id",
    id_column: "i.id",
    search_columns: &["i.name", "i.external_id", "i.description"],
    filters: &[FilterColumn::eq(
        "parentId",
        "i.parent_id",
        FilterKind::NullableId,
    )],
    sort_columns: &[
        SortColumn::new("name", "i.name"),
        SortColumn::new("externalId", "i.external_id"),
        SortColumn::new("createdAt", "i.created_at"),
        SortColumn::new("updatedAt", "i.updated_at"),
    ],
    default_sort: ("name", SortDirection::Asc),
    transform: industry::transform,
});

pub struct IndustryRepo;

impl IndustryRepo {
    pub async fn create(pool: &PgPool, input: &CreateIndustry) -> Result<Industry, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO industries (name, external_id, description, parent_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(input.name.trim())
        .bind(&input.external_id)
        .bind(&input.description)
        .bind(input.parent_id)
        .fetch_one(pool)
        .await?;

        INDUSTRY_PROVIDER.get(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateIndustry,
    ) -> Result<Option<Industry>, sqlx::Error> {
        let updated: Option<DbId> = sqlx::query_scalar(
            "UPDATE industries SET
                name = COALESCE($2, name),
                external_id = COALESCE($3, external_id),
                description = COALESCE($4, description),
                parent_id = COALESCE($5, parent_id)
             WHERE id = $1
             RETURNING id",
        )
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.external_id)
        .bind(&input.description)
        .bind(input.parent_id)
        .fetch_optional(pool)
        .await?;

        match updated {
            Some(id) => INDUSTRY_PROVIDER.get(pool, id).await,
            None => Ok(None),
        }
    }

    /// Whether making `new_parent_id` the parent of `id` would close a loop,
    /// i.e. `id` is `new_parent_id` or one of its ancestors.
    pub async fn would_create_cycle(
        pool: &PgPool,
        id: DbId,
        new_parent_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "WITH RECURSIVE ancestors AS (
                SELECT id, parent_id FROM industries WHERE id = $2
                UNION
                SELECT i.id, i.parent_id
                FROM industries i JOIN ancestors a ON i.id = a.parent_id
             )
             SELECT EXISTS(SELECT 1 FROM ancestors WHERE id = $1)",
        )
        .bind(id)
        .bind(new_parent_id)
        .fetch_one(pool)
        .await
    }
}
