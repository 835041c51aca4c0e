//! Handlers for the `/clients` resource.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use clientdesk_core::audit::{actions, entities};
use clientdesk_core::error::CoreError;
use clientdesk_core::listing::{parse_list_query, PaginatedResponse};
use clientdesk_core::types::DbId;
use clientdesk_db::models::client::{Client, CreateClient, UpdateClient};
use clientdesk_db::repositories::{
    ClientRepo, CLIENT_PROVIDER, CONTRACT_PROVIDER, INDUSTRY_PROVIDER,
};

use crate::audit::AuditEvent;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::permission::{ClientsDelete, ClientsRead, ClientsWrite, Require};
use crate::response::SuccessResponse;
use crate::state::AppState;

/// Reject an `externalId` already held by another client.
async fn ensure_external_id_free(
    state: &AppState,
    external_id: Option<&str>,
    exclude_id: Option<DbId>,
) -> AppResult<()> {
    if let Some(external_id) = external_id {
        if CLIENT_PROVIDER
            .value_taken(&state.pool, "external_id", external_id, exclude_id)
            .await?
        {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "A client with externalId '{external_id}' already exists"
            ))));
        }
    }
    Ok(())
}

async fn ensure_industry_exists(state: &AppState, industry_id: Option<DbId>) -> AppResult<()> {
    if let Some(industry_id) = industry_id {
        if !INDUSTRY_PROVIDER.exists(&state.pool, industry_id).await? {
            return Err(AppError::invalid_field("industryId", "Industry not found"));
        }
    }
    Ok(())
}

/// GET /api/clients
pub async fn list(
    _auth: Require<ClientsRead>,
    State(state): State<AppState>,
    Query(raw): Query<HashMap<String, String>>,
) -> AppResult<Json<PaginatedResponse<Client>>> {
    let params = parse_list_query(&raw, &CLIENT_PROVIDER)?;
    let page = CLIENT_PROVIDER.list(&state.pool, &params).await?;
    Ok(Json(page))
}

/// GET /api/clients/{id}
pub async fn get_by_id(
    _auth: Require<ClientsRead>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Client>> {
    let client = CLIENT_PROVIDER
        .get(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Client", id))?;
    Ok(Json(client))
}

/// POST /api/clients
pub async fn create(
    auth: Require<ClientsWrite>,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateClient>,
) -> AppResult<(StatusCode, Json<Client>)> {
    ensure_external_id_free(&state, input.external_id.as_deref(), None).await?;
    ensure_industry_exists(&state, input.industry_id).await?;

    let client = ClientRepo::create(&state.pool, &input).await?;

    tracing::info!(client_id = client.id, user_id = auth.user_id, "Client created");
    state.audit.record(
        AuditEvent::entity(actions::CREATE, entities::CLIENT, client.id, auth.user_id)
            .with_details(&client),
    );

    Ok((StatusCode::CREATED, Json(client)))
}

/// PATCH|PUT /api/clients/{id}
pub async fn update(
    auth: Require<ClientsWrite>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateClient>,
) -> AppResult<Json<Client>> {
    if !CLIENT_PROVIDER.exists(&state.pool, id).await? {
        return Err(AppError::not_found("Client", id));
    }
    ensure_external_id_free(&state, input.external_id.as_deref(), Some(id)).await?;
    ensure_industry_exists(&state, input.industry_id).await?;

    let client = ClientRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Client", id))?;

    state.audit.record(
        AuditEvent::entity(actions::UPDATE, entities::CLIENT, id, auth.user_id)
            .with_details(&client),
    );

    Ok(Json(client))
}

/// DELETE /api/clients/{id}
///
/// Refused while the client still has contracts.
pub async fn delete(
    auth: Require<ClientsDelete>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<SuccessResponse>> {
    if !CLIENT_PROVIDER.exists(&state.pool, id).await? {
        return Err(AppError::not_found("Client", id));
    }

    let contracts = CONTRACT_PROVIDER
        .count_where(&state.pool, "client_id", id)
        .await?;
    if contracts > 0 {
        return Err(AppError::Core(CoreError::HasDependents(format!(
            "Client has {contracts} contract(s); delete them first"
        ))));
    }

    if !CLIENT_PROVIDER.delete(&state.pool, id).await? {
        return Err(AppError::not_found("Client", id));
    }

    tracing::info!(client_id = id, user_id = auth.user_id, "Client deleted");
    state
        .audit
        .record(AuditEvent::entity(actions::DELETE, entities::CLIENT, id, auth.user_id));

    Ok(Json(SuccessResponse::ok()))
}
