//! Handlers for the `/roles` resource.
//!
//! Permission changes take effect at each user's next login, since tokens
//! carry the permission list they were issued with.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use clientdesk_core::audit::{actions, entities};
use clientdesk_core::error::CoreError;
use clientdesk_core::listing::{parse_list_query, PaginatedResponse};
use clientdesk_core::types::DbId;
use clientdesk_db::models::role::{CreateRole, Role, UpdateRole};
use clientdesk_db::repositories::{RoleRepo, ROLE_PROVIDER, USER_PROVIDER};

use crate::audit::AuditEvent;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::permission::{Require, RolesDelete, RolesRead, RolesWrite};
use crate::response::SuccessResponse;
use crate::state::AppState;

async fn ensure_name_free(state: &AppState, name: &str, exclude_id: Option<DbId>) -> AppResult<()> {
    let name = name.trim();
    if ROLE_PROVIDER
        .value_taken(&state.pool, "name", name, exclude_id)
        .await?
    {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "A role named '{name}' already exists"
        ))));
    }
    Ok(())
}

/// GET /api/roles
pub async fn list(
    _auth: Require<RolesRead>,
    State(state): State<AppState>,
    Query(raw): Query<HashMap<String, String>>,
) -> AppResult<Json<PaginatedResponse<Role>>> {
    let params = parse_list_query(&raw, &ROLE_PROVIDER)?;
    Ok(Json(ROLE_PROVIDER.list(&state.pool, &params).await?))
}

/// GET /api/roles/{id}
pub async fn get_by_id(
    _auth: Require<RolesRead>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Role>> {
    let role = ROLE_PROVIDER
        .get(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Role", id))?;
    Ok(Json(role))
}

/// POST /api/roles
pub async fn create(
    auth: Require<RolesWrite>,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateRole>,
) -> AppResult<(StatusCode, Json<Role>)> {
    ensure_name_free(&state, &input.name, None).await?;

    let role = RoleRepo::create(&state.pool, &input).await?;

    tracing::info!(role_id = role.id, user_id = auth.user_id, "Role created");
    state.audit.record(
        AuditEvent::entity(actions::CREATE, entities::ROLE, role.id, auth.user_id)
            .with_details(&role),
    );

    Ok((StatusCode::CREATED, Json(role)))
}

/// PATCH|PUT /api/roles/{id}
pub async fn update(
    auth: Require<RolesWrite>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateRole>,
) -> AppResult<Json<Role>> {
    if !ROLE_PROVIDER.exists(&state.pool, id).await? {
        return Err(AppError::not_found("Role", id));
    }
    if let Some(name) = &input.name {
        ensure_name_free(&state, name, Some(id)).await?;
    }

    let role = RoleRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Role", id))?;

    state.audit.record(
        AuditEvent::entity(actions::UPDATE, entities::ROLE, id, auth.user_id).with_details(&role),
    );

    Ok(Json(role))
}

/// DELETE /api/roles/{id}
///
/// Refused while any user holds the role.
pub async fn delete(
    auth: Require<RolesDelete>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<SuccessResponse>> {
    if !ROLE_PROVIDER.exists(&state.pool, id).await? {
        return Err(AppError::not_found("Role", id));
    }

    let users = USER_PROVIDER.count_where(&state.pool, "role_id", id).await?;
    if users > 0 {
        return Err(AppError::Core(CoreError::HasDependents(format!(
            "Role is assigned to {users} user(s)"
        ))));
    }

    if !ROLE_PROVIDER.delete(&state.pool, id).await? {
        return Err(AppError::not_found("Role", id));
    }

    tracing::info!(role_id = id, user_id = auth.user_id, "Role deleted");
    state
        .audit
        .record(AuditEvent::entity(actions::DELETE, entities::ROLE, id, auth.user_id));

    Ok(Json(SuccessResponse::ok()))
}
