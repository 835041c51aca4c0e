//! Login and current-user handlers.

use axum::extract::State;
use axum::Json;
use clientdesk_core::audit::actions;
use clientdesk_core::error::CoreError;
use clientdesk_db::models::user::User;
use clientdesk_db::repositories::{UserRepo, USER_PROVIDER};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::audit::AuditEvent;
use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub user: User,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid email or password".into()))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password are indistinguishable to the caller.
/// A deactivated account with the right password gets 403.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let credentials = UserRepo::find_credentials_by_email(&state.pool, &input.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    let valid = verify_password(&input.password, &credentials.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))?;
    if !valid {
        tracing::info!(user_id = credentials.id, "Login rejected: wrong password");
        return Err(invalid_credentials());
    }

    if !credentials.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let access_token = generate_access_token(
        credentials.id,
        &credentials.role_name,
        &credentials.permissions,
        &state.config.jwt,
    )
    .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    UserRepo::record_login(&state.pool, credentials.id).await?;
    let user = USER_PROVIDER
        .get(&state.pool, credentials.id)
        .await?
        .ok_or(AppError::not_found("User", credentials.id))?;

    tracing::info!(user_id = user.id, role = %credentials.role_name, "User logged in");
    state.audit.record(AuditEvent {
        user_id: Some(user.id),
        action: actions::LOGIN,
        entity_type: None,
        entity_id: None,
        details: Some(serde_json::json!({ "email": credentials.email })),
    });

    Ok(Json(LoginResponse {
        access_token,
        expires_in: state.config.jwt.expires_in_secs(),
        user,
    }))
}

/// GET /api/auth/me
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> AppResult<Json<User>> {
    let user = USER_PROVIDER
        .get(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::not_found("User", auth.user_id))?;
    Ok(Json(user))
}
