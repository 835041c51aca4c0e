//! Handlers for the `/service-assignments` resource.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use clientdesk_core::audit::{actions, entities};
use clientdesk_core::error::{CoreError, FieldError};
use clientdesk_core::listing::{parse_list_query, PaginatedResponse};
use clientdesk_core::types::DbId;
use clientdesk_db::models::service_assignment::{
    CreateServiceAssignment, ServiceAssignment, UpdateServiceAssignment,
};
use clientdesk_db::repositories::{
    ServiceAssignmentRepo, CONTRACT_PROVIDER, KPI_PROVIDER, SERVICE_ASSIGNMENT_PROVIDER,
};

use crate::audit::AuditEvent;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::permission::{
    AssignmentsDelete, AssignmentsRead, AssignmentsWrite, Require,
};
use crate::response::SuccessResponse;
use crate::state::AppState;

async fn ensure_kpi_exists(state: &AppState, kpi_id: Option<DbId>) -> AppResult<()> {
    if let Some(kpi_id) = kpi_id {
        if !KPI_PROVIDER.exists(&state.pool, kpi_id).await? {
            return Err(AppError::invalid_field("kpiId", "KPI not found"));
        }
    }
    Ok(())
}

/// GET /api/service-assignments
pub async fn list(
    _auth: Require<AssignmentsRead>,
    State(state): State<AppState>,
    Query(raw): Query<HashMap<String, String>>,
) -> AppResult<Json<PaginatedResponse<ServiceAssignment>>> {
    let params = parse_list_query(&raw, &SERVICE_ASSIGNMENT_PROVIDER)?;
    Ok(Json(SERVICE_ASSIGNMENT_PROVIDER.list(&state.pool, &params).await?))
}

/// GET /api/service-assignments/{id}
pub async fn get_by_id(
    _auth: Require<AssignmentsRead>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<ServiceAssignment>> {
    let assignment = SERVICE_ASSIGNMENT_PROVIDER
        .get(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("ServiceAssignment", id))?;
    Ok(Json(assignment))
}

/// POST /api/service-assignments
///
/// Terminated contracts take no new assignments.
pub async fn create(
    auth: Require<AssignmentsWrite>,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateServiceAssignment>,
) -> AppResult<(StatusCode, Json<ServiceAssignment>)> {
    let contract = CONTRACT_PROVIDER
        .get(&state.pool, input.contract_id)
        .await?
        .ok_or_else(|| AppError::invalid_field("contractId", "Contract not found"))?;
    if contract.status.is_terminal() {
        return Err(AppError::Core(CoreError::PreconditionFailed(
            "Cannot add service assignments to a terminated contract".into(),
        )));
    }
    ensure_kpi_exists(&state, input.kpi_id).await?;

    let assignment = ServiceAssignmentRepo::create(&state.pool, &input).await?;

    state.audit.record(
        AuditEvent::entity(
            actions::CREATE,
            entities::SERVICE_ASSIGNMENT,
            assignment.id,
            auth.user_id,
        )
        .with_details(&assignment),
    );

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// PATCH|PUT /api/service-assignments/{id}
///
/// When both dates end up set, the end may not precede the start.
pub async fn update(
    auth: Require<AssignmentsWrite>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateServiceAssignment>,
) -> AppResult<Json<ServiceAssignment>> {
    let current = SERVICE_ASSIGNMENT_PROVIDER
        .get(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("ServiceAssignment", id))?;

    let start = input.start_date.or(current.start_date);
    let end = input.end_date.or(current.end_date);
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::Core(CoreError::InvalidFields(vec![FieldError::new(
                "endDate",
                "End date cannot be before start date",
            )])));
        }
    }
    ensure_kpi_exists(&state, input.kpi_id).await?;

    let assignment = ServiceAssignmentRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("ServiceAssignment", id))?;

    state.audit.record(
        AuditEvent::entity(actions::UPDATE, entities::SERVICE_ASSIGNMENT, id, auth.user_id)
            .with_details(&assignment),
    );

    Ok(Json(assignment))
}

/// DELETE /api/service-assignments/{id}
pub async fn delete(
    auth: Require<AssignmentsDelete>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<SuccessResponse>> {
    if !SERVICE_ASSIGNMENT_PROVIDER.delete(&state.pool, id).await? {
        return Err(AppError::not_found("ServiceAssignment", id));
    }

    state.audit.record(AuditEvent::entity(
        actions::DELETE,
        entities::SERVICE_ASSIGNMENT,
        id,
        auth.user_id,
    ));

    Ok(Json(SuccessResponse::ok()))
}
