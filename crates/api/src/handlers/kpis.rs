//! Handlers for the `/kpis` resource.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use clientdesk_core::audit::{actions, entities};
use clientdesk_core::error::CoreError;
use clientdesk_core::listing::{parse_list_query, PaginatedResponse};
use clientdesk_core::types::DbId;
use clientdesk_db::models::kpi::{CreateKpi, Kpi, UpdateKpi};
use clientdesk_db::repositories::{KpiRepo, KPI_PROVIDER};

use crate::audit::AuditEvent;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::permission::{KpisDelete, KpisRead, KpisWrite, Require};
use crate::response::SuccessResponse;
use crate::state::AppState;

async fn ensure_name_free(state: &AppState, name: &str, exclude_id: Option<DbId>) -> AppResult<()> {
    let name = name.trim();
    if KPI_PROVIDER
        .value_taken(&state.pool, "name", name, exclude_id)
        .await?
    {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "A KPI named '{name}' already exists"
        ))));
    }
    Ok(())
}

/// GET /api/kpis
pub async fn list(
    _auth: Require<KpisRead>,
    State(state): State<AppState>,
    Query(raw): Query<HashMap<String, String>>,
) -> AppResult<Json<PaginatedResponse<Kpi>>> {
    let params = parse_list_query(&raw, &KPI_PROVIDER)?;
    Ok(Json(KPI_PROVIDER.list(&state.pool, &params).await?))
}

/// GET /api/kpis/{id}
pub async fn get_by_id(
    _auth: Require<KpisRead>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Kpi>> {
    let kpi = KPI_PROVIDER
        .get(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Kpi", id))?;
    Ok(Json(kpi))
}

/// POST /api/kpis
pub async fn create(
    auth: Require<KpisWrite>,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateKpi>,
) -> AppResult<(StatusCode, Json<Kpi>)> {
    ensure_name_free(&state, &input.name, None).await?;

    let kpi = KpiRepo::create(&state.pool, &input).await?;

    state.audit.record(
        AuditEvent::entity(actions::CREATE, entities::KPI, kpi.id, auth.user_id)
            .with_details(&kpi),
    );

    Ok((StatusCode::CREATED, Json(kpi)))
}

/// PATCH|PUT /api/kpis/{id}
pub async fn update(
    auth: Require<KpisWrite>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateKpi>,
) -> AppResult<Json<Kpi>> {
    if !KPI_PROVIDER.exists(&state.pool, id).await? {
        return Err(AppError::not_found("Kpi", id));
    }
    if let Some(name) = &input.name {
        ensure_name_free(&state, name, Some(id)).await?;
    }

    let kpi = KpiRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Kpi", id))?;

    state.audit.record(
        AuditEvent::entity(actions::UPDATE, entities::KPI, id, auth.user_id).with_details(&kpi),
    );

    Ok(Json(kpi))
}

/// DELETE /api/kpis/{id}
///
/// Refused while an active service assignment tracks the KPI; finished
/// assignments keep their history with the KPI reference cleared.
pub async fn delete(
    auth: Require<KpisDelete>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<SuccessResponse>> {
    if !KPI_PROVIDER.exists(&state.pool, id).await? {
        return Err(AppError::not_found("Kpi", id));
    }

    let active = KpiRepo::count_active_assignments(&state.pool, id).await?;
    if active > 0 {
        return Err(AppError::Core(CoreError::HasDependents(format!(
            "KPI is used by {active} active service assignment(s)"
        ))));
    }

    if !KPI_PROVIDER.delete(&state.pool, id).await? {
        return Err(AppError::not_found("Kpi", id));
    }

    state
        .audit
        .record(AuditEvent::entity(actions::DELETE, entities::KPI, id, auth.user_id));

    Ok(Json(SuccessResponse::ok()))
}
