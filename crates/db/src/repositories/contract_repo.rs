//! Repository for the `contracts` table, including the row-locked
//! lifecycle writes used by renew and terminate.

use clientdesk_core::contract::{
    AssignmentStatus, ContractStatus, LifecycleState, CONTRACT_STATUSES, PAYMENT_STATUSES,
};
use clientdesk_core::listing::{FilterKind, SortDirection};
use clientdesk_core::types::{Date, DbId};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::models::contract::{self, Contract, ContractRow, CreateContract, UpdateContract};
use crate::models::decode_text_enum;
use crate::provider::{FilterColumn, Provider, ProviderConfig, SortColumn};

pub static CONTRACT_PROVIDER: Provider<ContractRow, Contract> = Provider::new(ProviderConfig {
    entity: "Contract",
    table: "contracts",
    select: "ct.id, ct.client_id, ct.start_date, ct.end_date, ct.billing_rate, ct.currency, \
             ct.status, ct.payment_status, ct.is_renewable, ct.is_auto_renew, ct.renewal_date, \
             ct.termination_reason, ct.termination_date, ct.created_at, ct.updated_at, \
             c.name AS client_name, \
             (SELECT COUNT(*) FROM service_assignments sa \
               WHERE sa.contract_id = ct.id AND sa.status = 'ACTIVE') AS active_assignment_count",
    from: "contracts ct JOIN clients c ON c.id = ct.client_id",
    id_column: "ct.id",
    search_columns: &["ct.currency", "ct.termination_reason", "c.name"],
    filters: &[
        FilterColumn::eq("clientId", "ct.client_id", FilterKind::Id),
        FilterColumn::eq("status", "ct.status", FilterKind::Enum(CONTRACT_STATUSES)),
        FilterColumn::eq(
            "paymentStatus",
            "ct.payment_status",
            FilterKind::Enum(PAYMENT_STATUSES),
        ),
        FilterColumn::eq("isRenewable", "ct.is_renewable", FilterKind::Bool),
        FilterColumn::eq("isAutoRenew", "ct.is_auto_renew", FilterKind::Bool),
        FilterColumn::lt("endDateBefore", "ct.end_date", FilterKind::Date),
        FilterColumn::gt("endDateAfter", "ct.end_date", FilterKind::Date),
    ],
    sort_columns: &[
        SortColumn::new("startDate", "ct.start_date"),
        SortColumn::new("endDate", "ct.end_date"),
        SortColumn::new("billingRate", "ct.billing_rate"),
        SortColumn::new("status", "ct.status"),
        SortColumn::new("paymentStatus", "ct.payment_status"),
        SortColumn::new("createdAt", "ct.created_at"),
        SortColumn::new("updatedAt", "ct.updated_at"),
    ],
    default_sort: ("createdAt", SortDirection::Desc),
    transform: contract::transform,
});

/// The columns the lifecycle rules need, read under `FOR UPDATE`.
#[derive(Debug, Clone, FromRow)]
struct LockedContractRow {
    id: DbId,
    client_id: DbId,
    start_date: Date,
    end_date: Date,
    status: String,
    is_renewable: bool,
}

/// A contract row held under a row lock for the rest of the transaction.
#[derive(Debug, Clone, Copy)]
pub struct LockedContract {
    pub id: DbId,
    pub client_id: DbId,
    pub start_date: Date,
    pub state: LifecycleState,
}

/// Create, update and lifecycle writes for contracts.
pub struct ContractRepo;

impl ContractRepo {
    /// Insert a contract for `client_id` and return it as a model.
    pub async fn create(
        pool: &PgPool,
        client_id: DbId,
        input: &CreateContract,
    ) -> Result<Contract, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO contracts
                (client_id, start_date, end_date, billing_rate, currency, status,
                 payment_status, is_renewable, is_auto_renew)
             VALUES ($1, $2, $3, $4, COALESCE($5, 'USD'), COALESCE($6, 'ACTIVE'),
                     COALESCE($7, 'PENDING'), COALESCE($8, true), COALESCE($9, false))
             RETURNING id",
        )
        .bind(client_id)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.billing_rate)
        .bind(&input.currency)
        .bind(input.status.map(ContractStatus::as_str))
        .bind(input.payment_status.map(|s| s.as_str()))
        .bind(input.is_renewable)
        .bind(input.is_auto_renew)
        .fetch_one(pool)
        .await?;

        CONTRACT_PROVIDER.get(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Load and row-lock a contract. Must run inside a transaction.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<LockedContract>, sqlx::Error> {
        let row = sqlx::query_as::<_, LockedContractRow>(
            "SELECT id, client_id, start_date, end_date, status, is_renewable
             FROM contracts WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(|r| {
            Ok(LockedContract {
                id: r.id,
                client_id: r.client_id,
                start_date: r.start_date,
                state: LifecycleState {
                    status: decode_text_enum("status", &r.status)?,
                    is_renewable: r.is_renewable,
                    end_date: r.end_date,
                },
            })
        })
        .transpose()
    }

    /// Number of `ACTIVE` service assignments on a contract.
    pub async fn count_active_assignments(
        conn: &mut PgConnection,
        contract_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*)::BIGINT FROM service_assignments
             WHERE contract_id = $1 AND status = $2",
        )
        .bind(contract_id)
        .bind(AssignmentStatus::Active.as_str())
        .fetch_one(&mut *conn)
        .await
    }

    /// Partial update on a locked row. The caller has already validated the
    /// merged dates and any status change.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateContract,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE contracts SET
                start_date = COALESCE($2, start_date),
                end_date = COALESCE($3, end_date),
                billing_rate = COALESCE($4, billing_rate),
                currency = COALESCE($5, currency),
                status = COALESCE($6, status),
                payment_status = COALESCE($7, payment_status),
                is_renewable = COALESCE($8, is_renewable),
                is_auto_renew = COALESCE($9, is_auto_renew)
             WHERE id = $1",
        )
        .bind(id)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.billing_rate)
        .bind(&input.currency)
        .bind(input.status.map(ContractStatus::as_str))
        .bind(input.payment_status.map(|s| s.as_str()))
        .bind(input.is_renewable)
        .bind(input.is_auto_renew)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply a renewal: new end date, renewal date today, status `RENEWED`.
    pub async fn renew(
        conn: &mut PgConnection,
        id: DbId,
        new_end_date: Date,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE contracts SET
                end_date = $2,
                renewal_date = (NOW() AT TIME ZONE 'UTC')::DATE,
                status = $3
             WHERE id = $1",
        )
        .bind(id)
        .bind(new_end_date)
        .bind(ContractStatus::Renewed.as_str())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Apply a termination: status `TERMINATED`, reason, and timestamp now.
    pub async fn terminate(
        conn: &mut PgConnection,
        id: DbId,
        reason: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE contracts SET
                status = $2,
                termination_reason = $3,
                termination_date = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(ContractStatus::Terminated.as_str())
        .bind(reason)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
