//! Service assignment model: work on a contract, optionally tracked by a KPI.

use clientdesk_core::contract::AssignmentStatus;
use clientdesk_core::types::{Date, DbId, Timestamp};
use clientdesk_core::validation::{flexible_date, schema_error, validate_not_blank};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use super::{decode_text_enum, RelationRef};

#[derive(Debug, Clone, FromRow)]
pub struct ServiceAssignmentRow {
    pub id: DbId,
    pub contract_id: DbId,
    pub kpi_id: Option<DbId>,
    pub name: String,
    pub status: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub kpi_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAssignment {
    pub id: DbId,
    pub contract_id: DbId,
    pub kpi_id: Option<DbId>,
    pub name: String,
    pub status: AssignmentStatus,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub kpi: Option<RelationRef>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub fn transform(row: ServiceAssignmentRow) -> Result<ServiceAssignment, sqlx::Error> {
    Ok(ServiceAssignment {
        status: decode_text_enum("status", &row.status)?,
        kpi: RelationRef::from_join(row.kpi_id, row.kpi_name),
        id: row.id,
        contract_id: row.contract_id,
        kpi_id: row.kpi_id,
        name: row.name,
        start_date: row.start_date,
        end_date: row.end_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_assignment_dates", skip_on_field_errors = false))]
pub struct CreateServiceAssignment {
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub contract_id: DbId,
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub kpi_id: Option<DbId>,
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    pub status: Option<AssignmentStatus>,
    #[serde(default, deserialize_with = "flexible_date::optional")]
    pub start_date: Option<Date>,
    #[serde(default, deserialize_with = "flexible_date::optional")]
    pub end_date: Option<Date>,
}

fn validate_assignment_dates(input: &CreateServiceAssignment) -> Result<(), ValidationError> {
    match (input.start_date, input.end_date) {
        (Some(start), Some(end)) if end < start => Err(schema_error(
            "date_order",
            "endDate",
            "End date must not be before start date",
        )),
        _ => Ok(()),
    }
}

/// The owning contract cannot change after creation.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceAssignment {
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub kpi_id: Option<DbId>,
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    pub status: Option<AssignmentStatus>,
    #[serde(default, deserialize_with = "flexible_date::optional")]
    pub start_date: Option<Date>,
    #[serde(default, deserialize_with = "flexible_date::optional")]
    pub end_date: Option<Date>,
}
