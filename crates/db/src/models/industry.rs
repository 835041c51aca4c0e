//! Industry model: a self-referential tree.

use clientdesk_core::types::{DbId, Timestamp};
use clientdesk_core::validation::validate_not_blank;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::RelationRef;

#[derive(Debug, Clone, FromRow)]
pub struct IndustryRow {
    pub id: DbId,
    pub name: String,
    pub external_id: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub parent_name: Option<String>,
    pub children_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Industry {
    pub id: DbId,
    pub name: String,
    pub external_id: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<DbId>,
    pub parent: Option<RelationRef>,
    pub children_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub fn transform(row: IndustryRow) -> Result<Industry, sqlx::Error> {
    Ok(Industry {
        parent: RelationRef::from_join(row.parent_id, row.parent_name),
        id: row.id,
        name: row.name,
        external_id: row.external_id,
        description: row.description,
        parent_id: row.parent_id,
        children_count: row.children_count,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateIndustry {
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "External id must be 1-100 characters"))]
    pub external_id: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub parent_id: Option<DbId>,
}

/// Absent fields are left unchanged; an industry cannot be moved back to
/// the root through a partial update.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIndustry {
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "External id must be 1-100 characters"))]
    pub external_id: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub parent_id: Option<DbId>,
}
