//! Repository for the `kpis` table.

use clientdesk_core::contract::AssignmentStatus;
use clientdesk_core::listing::{FilterKind, SortDirection};
use clientdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::kpi::{self, CreateKpi, Kpi, KpiRow, UpdateKpi};
use crate::provider::{FilterColumn, Provider, ProviderConfig, SortColumn};

pub static KPI_PROVIDER: Provider<KpiRow, Kpi> = Provider::new(ProviderConfig {
    entity: "KPI",
    table: "kpis",
    select: "k.id, k.name, k.description, k.unit, k.target_value, k.is_active, \
             k.created_at, k.updated_at, \
             (SELECT COUNT(*) FROM service_assignments sa \
               WHERE sa.kpi_id = k.id AND sa.status = 'ACTIVE') AS active_assignment_count",
    from: "kpis k",
    id_column: "k.id",
    search_columns: &["k.name", "k.description", "k.unit"],
    filters: &[FilterColumn::eq("isActive", "k.is_active", FilterKind::Bool)],
    sort_columns: &[
        SortColumn::new("name", "k.name"),
        SortColumn::new("targetValue", "k.target_value"),
        SortColumn::new("createdAt", "k.created_at"),
        SortColumn::new("updatedAt", "k.updated_at"),
    ],
    default_sort: ("name", SortDirection::Asc),
    transform: kpi::transform,
});

pub struct KpiRepo;

impl KpiRepo {
    pub async fn create(pool: &PgPool, input: &CreateKpi) -> Result<Kpi, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO kpis (name, description, unit, target_value, is_active)
             VALUES ($1, $2, $3, $4, COALESCE($5, true))
             RETURNING id",
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(&input.unit)
        .bind(input.target_value)
        .bind(input.is_active)
        .fetch_one(pool)
        .await?;

        KPI_PROVIDER.get(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateKpi,
    ) -> Result<Option<Kpi>, sqlx::Error> {
        let updated: Option<DbId> = sqlx::query_scalar(
            "UPDATE kpis SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                unit = COALESCE($4, unit),
                target_value = COALESCE($5, target_value),
                is_active = COALESCE($6, is_active)
             WHERE id = $1
             RETURNING id",
        )
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.description)
        .bind(&input.unit)
        .bind(input.target_value)
        .bind(input.is_active)
        .fetch_optional(pool)
        .await?;

        match updated {
            Some(id) => KPI_PROVIDER.get(pool, id).await,
            None => Ok(None),
        }
    }

    /// `ACTIVE` assignments referencing the KPI; any blocks deletion.
    pub async fn count_active_assignments(pool: &PgPool, kpi_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*)::BIGINT FROM service_assignments WHERE kpi_id = $1 AND status = $2",
        )
        .bind(kpi_id)
        .bind(AssignmentStatus::Active.as_str())
        .fetch_one(pool)
        .await
    }
}
