//! Client entity model and DTOs.

use clientdesk_core::types::{DbId, Timestamp};
use clientdesk_core::validation::validate_not_blank;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::RelationRef;

/// A `clients` row joined with its industry name and contract count.
#[derive(Debug, Clone, FromRow)]
pub struct ClientRow {
    pub id: DbId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub external_id: Option<String>,
    pub industry_id: Option<DbId>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub industry_name: Option<String>,
    pub contract_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: DbId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub external_id: Option<String>,
    pub industry_id: Option<DbId>,
    pub is_active: bool,
    pub industry: Option<RelationRef>,
    pub contract_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub fn transform(row: ClientRow) -> Result<Client, sqlx::Error> {
    Ok(Client {
        industry: RelationRef::from_join(row.industry_id, row.industry_name),
        id: row.id,
        name: row.name,
        email: row.email,
        phone: row.phone,
        external_id: row.external_id,
        industry_id: row.industry_id,
        is_active: row.is_active,
        contract_count: row.contract_count,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// DTO for creating a client.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClient {
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 100, message = "External id must be 1-100 characters"))]
    pub external_id: Option<String>,
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub industry_id: Option<DbId>,
    pub is_active: Option<bool>,
}

/// DTO for updating a client. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClient {
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 100, message = "External id must be 1-100 characters"))]
    pub external_id: Option<String>,
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub industry_id: Option<DbId>,
    pub is_active: Option<bool>,
}
