//! Handlers for the `/users` resource.
//!
//! Passwords arrive in plaintext, are hashed here, and never leave the
//! database again.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use clientdesk_core::audit::{actions, entities};
use clientdesk_core::error::CoreError;
use clientdesk_core::listing::{parse_list_query, PaginatedResponse};
use clientdesk_core::types::DbId;
use clientdesk_db::models::user::{
    CreateUser, CreateUserRequest, UpdateUser, UpdateUserRequest, User,
};
use clientdesk_db::repositories::{UserRepo, ROLE_PROVIDER, USER_PROVIDER};

use crate::audit::AuditEvent;
use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::permission::{Require, UsersDelete, UsersRead, UsersWrite};
use crate::response::SuccessResponse;
use crate::state::AppState;

/// Emails are unique regardless of case, matching the login lookup.
async fn ensure_email_free(state: &AppState, email: &str, exclude_id: Option<DbId>) -> AppResult<()> {
    let existing = UserRepo::find_credentials_by_email(&state.pool, email).await?;
    match existing {
        Some(user) if Some(user.id) != exclude_id => Err(AppError::Core(CoreError::Conflict(
            format!("A user with email '{}' already exists", email.trim()),
        ))),
        _ => Ok(()),
    }
}

async fn ensure_role_exists(state: &AppState, role_id: DbId) -> AppResult<()> {
    if ROLE_PROVIDER.exists(&state.pool, role_id).await? {
        Ok(())
    } else {
        Err(AppError::invalid_field("roleId", "Role not found"))
    }
}

fn hash(password: &str) -> AppResult<String> {
    hash_password(password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))
}

/// GET /api/users
pub async fn list(
    _auth: Require<UsersRead>,
    State(state): State<AppState>,
    Query(raw): Query<HashMap<String, String>>,
) -> AppResult<Json<PaginatedResponse<User>>> {
    let params = parse_list_query(&raw, &USER_PROVIDER)?;
    Ok(Json(USER_PROVIDER.list(&state.pool, &params).await?))
}

/// GET /api/users/{id}
pub async fn get_by_id(
    _auth: Require<UsersRead>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<User>> {
    let user = USER_PROVIDER
        .get(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("User", id))?;
    Ok(Json(user))
}

/// POST /api/users
pub async fn create(
    auth: Require<UsersWrite>,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    ensure_email_free(&state, &input.email, None).await?;
    ensure_role_exists(&state, input.role_id).await?;

    let create = CreateUser {
        email: input.email,
        name: input.name,
        password_hash: hash(&input.password)?,
        role_id: input.role_id,
        is_active: input.is_active,
    };
    let user = UserRepo::create(&state.pool, &create).await?;

    tracing::info!(new_user_id = user.id, user_id = auth.user_id, "User created");
    state.audit.record(
        AuditEvent::entity(actions::CREATE, entities::USER, user.id, auth.user_id)
            .with_details(&user),
    );

    Ok((StatusCode::CREATED, Json(user)))
}

/// PATCH|PUT /api/users/{id}
pub async fn update(
    auth: Require<UsersWrite>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    if !USER_PROVIDER.exists(&state.pool, id).await? {
        return Err(AppError::not_found("User", id));
    }
    if let Some(email) = &input.email {
        ensure_email_free(&state, email, Some(id)).await?;
    }
    if let Some(role_id) = input.role_id {
        ensure_role_exists(&state, role_id).await?;
    }

    let password_changed = input.password.is_some();
    let update = UpdateUser {
        email: input.email,
        name: input.name,
        password_hash: input.password.as_deref().map(hash).transpose()?,
        role_id: input.role_id,
        is_active: input.is_active,
    };
    let user = UserRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(AppError::not_found("User", id))?;

    state.audit.record(
        AuditEvent::entity(actions::UPDATE, entities::USER, id, auth.user_id).with_details(
            &serde_json::json!({ "user": &user, "passwordChanged": password_changed }),
        ),
    );

    Ok(Json(user))
}

/// DELETE /api/users/{id}
///
/// A user cannot delete their own account.
pub async fn delete(
    auth: Require<UsersDelete>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<SuccessResponse>> {
    if id == auth.user_id {
        return Err(AppError::Core(CoreError::PreconditionFailed(
            "You cannot delete your own account".into(),
        )));
    }
    if !USER_PROVIDER.delete(&state.pool, id).await? {
        return Err(AppError::not_found("User", id));
    }

    tracing::info!(deleted_user_id = id, user_id = auth.user_id, "User deleted");
    state
        .audit
        .record(AuditEvent::entity(actions::DELETE, entities::USER, id, auth.user_id));

    Ok(Json(SuccessResponse::ok()))
}
