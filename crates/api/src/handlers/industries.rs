//! Handlers for the `/industries` resource.
//!
//! Industries form a tree through `parentId`. Updates may not introduce a
//! cycle, and an industry with children cannot be deleted.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use clientdesk_core::audit::{actions, entities};
use clientdesk_core::error::CoreError;
use clientdesk_core::listing::{parse_list_query, PaginatedResponse};
use clientdesk_core::types::DbId;
use clientdesk_db::models::industry::{CreateIndustry, Industry, UpdateIndustry};
use clientdesk_db::repositories::{IndustryRepo, INDUSTRY_PROVIDER};

use crate::audit::AuditEvent;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::permission::{IndustriesDelete, IndustriesRead, IndustriesWrite, Require};
use crate::response::SuccessResponse;
use crate::state::AppState;

async fn ensure_external_id_free(
    state: &AppState,
    external_id: Option<&str>,
    exclude_id: Option<DbId>,
) -> AppResult<()> {
    if let Some(external_id) = external_id {
        if INDUSTRY_PROVIDER
            .value_taken(&state.pool, "external_id", external_id, exclude_id)
            .await?
        {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "An industry with externalId '{external_id}' already exists"
            ))));
        }
    }
    Ok(())
}

async fn ensure_parent_exists(state: &AppState, parent_id: DbId) -> AppResult<()> {
    if INDUSTRY_PROVIDER.exists(&state.pool, parent_id).await? {
        Ok(())
    } else {
        Err(AppError::invalid_field("parentId", "Parent industry not found"))
    }
}

/// GET /api/industries
pub async fn list(
    _auth: Require<IndustriesRead>,
    State(state): State<AppState>,
    Query(raw): Query<HashMap<String, String>>,
) -> AppResult<Json<PaginatedResponse<Industry>>> {
    let params = parse_list_query(&raw, &INDUSTRY_PROVIDER)?;
    let page = INDUSTRY_PROVIDER.list(&state.pool, &params).await?;
    Ok(Json(page))
}

/// GET /api/industries/{id}
pub async fn get_by_id(
    _auth: Require<IndustriesRead>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Industry>> {
    let industry = INDUSTRY_PROVIDER
        .get(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Industry", id))?;
    Ok(Json(industry))
}

/// POST /api/industries
///
/// A duplicate `externalId` is rejected before anything is written.
pub async fn create(
    auth: Require<IndustriesWrite>,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateIndustry>,
) -> AppResult<(StatusCode, Json<Industry>)> {
    ensure_external_id_free(&state, input.external_id.as_deref(), None).await?;
    if let Some(parent_id) = input.parent_id {
        ensure_parent_exists(&state, parent_id).await?;
    }

    let industry = IndustryRepo::create(&state.pool, &input).await?;

    tracing::info!(industry_id = industry.id, user_id = auth.user_id, "Industry created");
    state.audit.record(
        AuditEvent::entity(actions::CREATE, entities::INDUSTRY, industry.id, auth.user_id)
            .with_details(&industry),
    );

    Ok((StatusCode::CREATED, Json(industry)))
}

/// PATCH|PUT /api/industries/{id}
pub async fn update(
    auth: Require<IndustriesWrite>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateIndustry>,
) -> AppResult<Json<Industry>> {
    if !INDUSTRY_PROVIDER.exists(&state.pool, id).await? {
        return Err(AppError::not_found("Industry", id));
    }
    ensure_external_id_free(&state, input.external_id.as_deref(), Some(id)).await?;

    if let Some(parent_id) = input.parent_id {
        ensure_parent_exists(&state, parent_id).await?;
        if IndustryRepo::would_create_cycle(&state.pool, id, parent_id).await? {
            return Err(AppError::invalid_field(
                "parentId",
                "An industry cannot be its own ancestor",
            ));
        }
    }

    let industry = IndustryRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Industry", id))?;

    state.audit.record(
        AuditEvent::entity(actions::UPDATE, entities::INDUSTRY, id, auth.user_id)
            .with_details(&industry),
    );

    Ok(Json(industry))
}

/// DELETE /api/industries/{id}
///
/// Refused while any industry names this one as its parent. Clients in the
/// industry are detached.
pub async fn delete(
    auth: Require<IndustriesDelete>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<SuccessResponse>> {
    if !INDUSTRY_PROVIDER.exists(&state.pool, id).await? {
        return Err(AppError::not_found("Industry", id));
    }

    let children = INDUSTRY_PROVIDER
        .count_where(&state.pool, "parent_id", id)
        .await?;
    if children > 0 {
        return Err(AppError::Core(CoreError::HasDependents(format!(
            "Industry has {children} child industr{}",
            if children == 1 { "y" } else { "ies" }
        ))));
    }

    if !INDUSTRY_PROVIDER.delete(&state.pool, id).await? {
        return Err(AppError::not_found("Industry", id));
    }

    tracing::info!(industry_id = id, user_id = auth.user_id, "Industry deleted");
    state
        .audit
        .record(AuditEvent::entity(actions::DELETE, entities::INDUSTRY, id, auth.user_id));

    Ok(Json(SuccessResponse::ok()))
}
