//! Role entity model.

use clientdesk_core::types::{DbId, Timestamp};
use clientdesk_core::validation::{validate_not_blank, validate_permissions};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow)]
pub struct RoleRow {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub user_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub user_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub fn transform(row: RoleRow) -> Result<Role, sqlx::Error> {
    Ok(Role {
        id: row.id,
        name: row.name,
        description: row.description,
        permissions: row.permissions,
        user_count: row.user_count,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRole {
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_permissions"))]
    pub permissions: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRole {
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_permissions"))]
    pub permissions: Option<Vec<String>>,
}
