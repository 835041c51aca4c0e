//! Repository for the `service_assignments` table.

use clientdesk_core::contract::{AssignmentStatus, ASSIGNMENT_STATUSES};
use clientdesk_core::listing::{FilterKind, SortDirection};
use clientdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::service_assignment::{
    self, CreateServiceAssignment, ServiceAssignment, ServiceAssignmentRow,
    UpdateServiceAssignment,
};
use crate::provider::{FilterColumn, Provider, ProviderConfig, SortColumn};

pub static SERVICE_ASSIGNMENT_PROVIDER: Provider<ServiceAssignmentRow, ServiceAssignment> =
    Provider::new(ProviderConfig {
        entity: "ServiceAssignment",
        table: "service_assignments",
        select: "sa.id, sa.contract_id, sa.kpi_id, sa.name, sa.status, sa.start_date, \
                 sa.end_date, sa.created_at, sa.updated_at, k.name AS kpi_name",
        from: "service_assignments sa LEFT JOIN kpis k ON k.id = sa.kpi_id",
        id_column: "sa.id",
        search_columns: &["sa.name"],
        filters: &[
            FilterColumn::eq("contractId", "sa.contract_id", FilterKind::Id),
            FilterColumn::eq("kpiId", "sa.kpi_id", FilterKind::Id),
            FilterColumn::eq("status", "sa.status", FilterKind::Enum(ASSIGNMENT_STATUSES)),
        ],
        sort_columns: &[
            SortColumn::new("name", "sa.name"),
            SortColumn::new("status", "sa.status"),
            SortColumn::new("startDate", "sa.start_date"),
            SortColumn::new("endDate", "sa.end_date"),
            SortColumn::new("createdAt", "sa.created_at"),
        ],
        default_sort: ("createdAt", SortDirection::Desc),
        transform: service_assignment::transform,
    });

pub struct ServiceAssignmentRepo;

impl ServiceAssignmentRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateServiceAssignment,
    ) -> Result<ServiceAssignment, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO service_assignments
                (contract_id, kpi_id, name, status, start_date, end_date)
             VALUES ($1, $2, $3, COALESCE($4, 'ACTIVE'), $5, $6)
             RETURNING id",
        )
        .bind(input.contract_id)
        .bind(input.kpi_id)
        .bind(input.name.trim())
        .bind(input.status.map(AssignmentStatus::as_str))
        .bind(input.start_date)
        .bind(input.end_date)
        .fetch_one(pool)
        .await?;

        SERVICE_ASSIGNMENT_PROVIDER
            .get(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateServiceAssignment,
    ) -> Result<Option<ServiceAssignment>, sqlx::Error> {
        let updated: Option<DbId> = sqlx::query_scalar(
            "UPDATE service_assignments SET
                kpi_id = COALESCE($2, kpi_id),
                name = COALESCE($3, name),
                status = COALESCE($4, status),
                start_date = COALESCE($5, start_date),
                end_date = COALESCE($6, end_date)
             WHERE id = $1
             RETURNING id",
        )
        .bind(id)
        .bind(input.kpi_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.status.map(AssignmentStatus::as_str))
        .bind(input.start_date)
        .bind(input.end_date)
        .fetch_optional(pool)
        .await?;

        match updated {
            Some(id) => SERVICE_ASSIGNMENT_PROVIDER.get(pool, id).await,
            None => Ok(None),
        }
    }
}
