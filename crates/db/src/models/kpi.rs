//! KPI entity model and DTOs.

use clientdesk_core::types::{DbId, Timestamp};
use clientdesk_core::validation::validate_not_blank;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow)]
pub struct KpiRow {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub target_value: Option<f64>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub active_assignment_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpi {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub target_value: Option<f64>,
    pub is_active: bool,
    pub active_assignment_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub fn transform(row: KpiRow) -> Result<Kpi, sqlx::Error> {
    Ok(Kpi {
        id: row.id,
        name: row.name,
        description: row.description,
        unit: row.unit,
        target_value: row.target_value,
        is_active: row.is_active,
        active_assignment_count: row.active_assignment_count,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateKpi {
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 50, message = "Unit must be at most 50 characters"))]
    pub unit: Option<String>,
    pub target_value: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateKpi {
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 50, message = "Unit must be at most 50 characters"))]
    pub unit: Option<String>,
    pub target_value: Option<f64>,
    pub is_active: Option<bool>,
}
