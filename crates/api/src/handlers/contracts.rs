//! Handlers for contracts.
//!
//! Contracts are managed under their client (`/clients/{client_id}/contracts`);
//! a contract id that belongs to a different client is reported as not
//! found. A read-only `/contracts` listing spans all clients.
//!
//! Updates, renewals, and terminations run in a transaction that holds a
//! row lock on the contract between the precondition checks and the write.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use clientdesk_core::audit::{actions, entities};
use clientdesk_core::contract::{
    check_date_order, check_renewal, check_termination, validate_status_change,
};
use clientdesk_core::listing::{parse_list_query, FilterValue, PaginatedResponse};
use clientdesk_core::types::DbId;
use clientdesk_db::models::contract::{
    Contract, CreateContract, RenewContract, TerminateContract, UpdateContract,
};
use clientdesk_db::repositories::{ContractRepo, LockedContract, CLIENT_PROVIDER, CONTRACT_PROVIDER};
use sqlx::PgConnection;

use crate::audit::AuditEvent;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::permission::{ContractsDelete, ContractsRead, ContractsWrite, Require};
use crate::response::SuccessResponse;
use crate::state::AppState;

async fn ensure_client_exists(state: &AppState, client_id: DbId) -> AppResult<()> {
    if CLIENT_PROVIDER.exists(&state.pool, client_id).await? {
        Ok(())
    } else {
        Err(AppError::not_found("Client", client_id))
    }
}

/// Fetch a contract and check it belongs to `client_id`.
async fn find_owned(state: &AppState, client_id: DbId, id: DbId) -> AppResult<Contract> {
    CONTRACT_PROVIDER
        .get(&state.pool, id)
        .await?
        .filter(|c| c.client_id == client_id)
        .ok_or(AppError::not_found("Contract", id))
}

/// Lock a contract row for the rest of the transaction and check ownership.
async fn lock_owned(
    conn: &mut PgConnection,
    client_id: DbId,
    id: DbId,
) -> AppResult<LockedContract> {
    ContractRepo::find_for_update(conn, id)
        .await?
        .filter(|c| c.client_id == client_id)
        .ok_or(AppError::not_found("Contract", id))
}

async fn reload(state: &AppState, id: DbId) -> AppResult<Contract> {
    CONTRACT_PROVIDER
        .get(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Contract", id))
}

/// GET /api/contracts
pub async fn list_all(
    _auth: Require<ContractsRead>,
    State(state): State<AppState>,
    Query(raw): Query<HashMap<String, String>>,
) -> AppResult<Json<PaginatedResponse<Contract>>> {
    let params = parse_list_query(&raw, &CONTRACT_PROVIDER)?;
    let page = CONTRACT_PROVIDER.list(&state.pool, &params).await?;
    Ok(Json(page))
}

/// GET /api/clients/{client_id}/contracts
pub async fn list(
    _auth: Require<ContractsRead>,
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
    Query(raw): Query<HashMap<String, String>>,
) -> AppResult<Json<PaginatedResponse<Contract>>> {
    ensure_client_exists(&state, client_id).await?;

    let params = parse_list_query(&raw, &CONTRACT_PROVIDER)?
        .with_filter("clientId", FilterValue::Int(client_id));
    let page = CONTRACT_PROVIDER.list(&state.pool, &params).await?;
    Ok(Json(page))
}

/// GET /api/clients/{client_id}/contracts/{id}
pub async fn get_by_id(
    _auth: Require<ContractsRead>,
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<Contract>> {
    Ok(Json(find_owned(&state, client_id, id).await?))
}

/// POST /api/clients/{client_id}/contracts
pub async fn create(
    auth: Require<ContractsWrite>,
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<CreateContract>,
) -> AppResult<(StatusCode, Json<Contract>)> {
    ensure_client_exists(&state, client_id).await?;

    let contract = ContractRepo::create(&state.pool, client_id, &input).await?;

    tracing::info!(
        contract_id = contract.id,
        client_id,
        user_id = auth.user_id,
        "Contract created",
    );
    state.audit.record(
        AuditEvent::entity(actions::CREATE, entities::CONTRACT, contract.id, auth.user_id)
            .with_details(&contract),
    );

    Ok((StatusCode::CREATED, Json(contract)))
}

/// PATCH|PUT /api/clients/{client_id}/contracts/{id}
///
/// Date order is checked on the merged values, and a status change must be
/// an allowed transition from the stored status.
pub async fn update(
    auth: Require<ContractsWrite>,
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
    ValidatedJson(input): ValidatedJson<UpdateContract>,
) -> AppResult<Json<Contract>> {
    let mut tx = state.pool.begin().await?;
    let locked = lock_owned(&mut tx, client_id, id).await?;

    check_date_order(
        input.start_date.unwrap_or(locked.start_date),
        input.end_date.unwrap_or(locked.state.end_date),
    )?;
    if let Some(next) = input.status {
        validate_status_change(locked.state.status, next)?;
    }

    ContractRepo::update(&mut tx, id, &input).await?;
    tx.commit().await?;

    let contract = reload(&state, id).await?;

    if input.status.is_some_and(|s| s != locked.state.status) {
        tracing::info!(
            contract_id = id,
            from = %locked.state.status,
            to = %contract.status,
            user_id = auth.user_id,
            "Contract status changed",
        );
    }
    state.audit.record(
        AuditEvent::entity(actions::UPDATE, entities::CONTRACT, id, auth.user_id)
            .with_details(&contract),
    );

    Ok(Json(contract))
}

/// DELETE /api/clients/{client_id}/contracts/{id}
///
/// Service assignments go with the contract.
pub async fn delete(
    auth: Require<ContractsDelete>,
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<SuccessResponse>> {
    find_owned(&state, client_id, id).await?;

    if !CONTRACT_PROVIDER.delete(&state.pool, id).await? {
        return Err(AppError::not_found("Contract", id));
    }

    tracing::info!(contract_id = id, client_id, user_id = auth.user_id, "Contract deleted");
    state
        .audit
        .record(AuditEvent::entity(actions::DELETE, entities::CONTRACT, id, auth.user_id));

    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/clients/{client_id}/contracts/{id}/renew
pub async fn renew(
    auth: Require<ContractsWrite>,
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
    ValidatedJson(input): ValidatedJson<RenewContract>,
) -> AppResult<Json<Contract>> {
    let mut tx = state.pool.begin().await?;
    let locked = lock_owned(&mut tx, client_id, id).await?;

    let new_end_date = check_renewal(&locked.state, input.new_end_date.as_deref())?;
    ContractRepo::renew(&mut tx, id, new_end_date).await?;
    tx.commit().await?;

    let contract = reload(&state, id).await?;

    tracing::info!(
        contract_id = id,
        previous_end_date = %locked.state.end_date,
        new_end_date = %new_end_date,
        user_id = auth.user_id,
        "Contract renewed",
    );
    state.audit.record(
        AuditEvent::entity(actions::CONTRACT_RENEW, entities::CONTRACT, id, auth.user_id)
            .with_details(&serde_json::json!({
                "previousEndDate": locked.state.end_date,
                "newEndDate": new_end_date,
            })),
    );

    Ok(Json(contract))
}

/// POST /api/clients/{client_id}/contracts/{id}/terminate
pub async fn terminate(
    auth: Require<ContractsWrite>,
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
    ValidatedJson(input): ValidatedJson<TerminateContract>,
) -> AppResult<Json<Contract>> {
    let mut tx = state.pool.begin().await?;
    let locked = lock_owned(&mut tx, client_id, id).await?;

    let active_assignments = ContractRepo::count_active_assignments(&mut tx, id).await?;
    let reason = check_termination(
        locked.state.status,
        input.reason.as_deref(),
        active_assignments,
    )?;
    ContractRepo::terminate(&mut tx, id, &reason).await?;
    tx.commit().await?;

    let contract = reload(&state, id).await?;

    tracing::info!(
        contract_id = id,
        from = %locked.state.status,
        user_id = auth.user_id,
        "Contract terminated",
    );
    state.audit.record(
        AuditEvent::entity(actions::CONTRACT_TERMINATE, entities::CONTRACT, id, auth.user_id)
            .with_details(&serde_json::json!({ "reason": reason })),
    );

    Ok(Json(contract))
}
