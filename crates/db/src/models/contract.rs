//! Contract entity model and DTOs.

use clientdesk_core::contract::{ContractStatus, PaymentStatus};
use clientdesk_core::types::{Date, DbId, Timestamp};
use clientdesk_core::validation::{flexible_date, schema_error, validate_currency};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use super::{decode_text_enum, RelationRef};

/// A `contracts` row joined with its client name and active assignment count.
#[derive(Debug, Clone, FromRow)]
pub struct ContractRow {
    pub id: DbId,
    pub client_id: DbId,
    pub start_date: Date,
    pub end_date: Date,
    pub billing_rate: f64,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
    pub is_renewable: bool,
    pub is_auto_renew: bool,
    pub renewal_date: Option<Date>,
    pub termination_reason: Option<String>,
    pub termination_date: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub client_name: String,
    pub active_assignment_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: DbId,
    pub client_id: DbId,
    pub start_date: Date,
    pub end_date: Date,
    pub billing_rate: f64,
    pub currency: String,
    pub status: ContractStatus,
    pub payment_status: PaymentStatus,
    pub is_renewable: bool,
    pub is_auto_renew: bool,
    pub renewal_date: Option<Date>,
    pub termination_reason: Option<String>,
    pub termination_date: Option<Timestamp>,
    pub client: RelationRef,
    pub active_assignment_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub fn transform(row: ContractRow) -> Result<Contract, sqlx::Error> {
    Ok(Contract {
        status: decode_text_enum("status", &row.status)?,
        payment_status: decode_text_enum("payment_status", &row.payment_status)?,
        client: RelationRef {
            id: row.client_id,
            name: row.client_name,
        },
        id: row.id,
        client_id: row.client_id,
        start_date: row.start_date,
        end_date: row.end_date,
        billing_rate: row.billing_rate,
        currency: row.currency,
        is_renewable: row.is_renewable,
        is_auto_renew: row.is_auto_renew,
        renewal_date: row.renewal_date,
        termination_reason: row.termination_reason,
        termination_date: row.termination_date,
        active_assignment_count: row.active_assignment_count,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// DTO for creating a contract under a client (the client id comes from
/// the path).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_contract_dates", skip_on_field_errors = false))]
pub struct CreateContract {
    #[serde(deserialize_with = "flexible_date::required")]
    pub start_date: Date,
    #[serde(deserialize_with = "flexible_date::required")]
    pub end_date: Date,
    #[validate(range(exclusive_min = 0.0, message = "Billing rate must be greater than 0"))]
    pub billing_rate: f64,
    #[validate(custom(function = "validate_currency"))]
    pub currency: Option<String>,
    #[validate(custom(function = "validate_initial_status"))]
    pub status: Option<ContractStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub is_renewable: Option<bool>,
    pub is_auto_renew: Option<bool>,
}

fn validate_contract_dates(input: &CreateContract) -> Result<(), ValidationError> {
    if input.start_date < input.end_date {
        Ok(())
    } else {
        Err(schema_error(
            "date_order",
            "endDate",
            "End date must be after start date",
        ))
    }
}

fn validate_initial_status(status: &ContractStatus) -> Result<(), ValidationError> {
    if status.is_terminal() {
        Err(ValidationError::new("status")
            .with_message("Contracts cannot be created as TERMINATED".into()))
    } else {
        Ok(())
    }
}

/// DTO for updating a contract. Absent fields are left unchanged.
///
/// Date order and status transitions depend on the stored row and are
/// checked by the caller after merging.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContract {
    #[serde(default, deserialize_with = "flexible_date::optional")]
    pub start_date: Option<Date>,
    #[serde(default, deserialize_with = "flexible_date::optional")]
    pub end_date: Option<Date>,
    #[validate(range(exclusive_min = 0.0, message = "Billing rate must be greater than 0"))]
    pub billing_rate: Option<f64>,
    #[validate(custom(function = "validate_currency"))]
    pub currency: Option<String>,
    pub status: Option<ContractStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub is_renewable: Option<bool>,
    pub is_auto_renew: Option<bool>,
}

/// Body of `POST .../contracts/{id}/renew`. The date is parsed by the
/// lifecycle rules so that renewability is checked first.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RenewContract {
    pub new_end_date: Option<String>,
}

/// Body of `POST .../contracts/{id}/terminate`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TerminateContract {
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use clientdesk_core::validation::collect_field_errors;
    use serde_json::json;

    use super::*;

    #[test]
    fn reversed_dates_and_negative_rate_are_both_reported() {
        let input: CreateContract = serde_json::from_value(json!({
            "startDate": "2025-12-31",
            "endDate": "2025-01-01",
            "billingRate": -5.0
        }))
        .unwrap();
        let errors = input.validate().unwrap_err();
        let fields: Vec<String> = collect_field_errors(&errors)
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["billingRate", "endDate"]);
    }

    #[test]
    fn zero_rate_is_rejected() {
        let input: CreateContract = serde_json::from_value(json!({
            "startDate": "2025-01-01",
            "endDate": "2025-12-31",
            "billingRate": 0.0
        }))
        .unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn currency_and_initial_status_are_checked() {
        let input: CreateContract = serde_json::from_value(json!({
            "startDate": "2025-01-01",
            "endDate": "2025-12-31",
            "billingRate": 100.0,
            "currency": "usd",
            "status": "TERMINATED"
        }))
        .unwrap();
        let fields: Vec<String> = collect_field_errors(&input.validate().unwrap_err())
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["currency", "status"]);
    }

    #[test]
    fn valid_contract_passes() {
        let input: CreateContract = serde_json::from_value(json!({
            "startDate": "2025-01-01",
            "endDate": "2025-12-31T00:00:00Z",
            "billingRate": 150.5,
            "currency": "EUR",
            "paymentStatus": "PAID"
        }))
        .unwrap();
        assert!(input.validate().is_ok());
        assert_eq!(input.payment_status, Some(PaymentStatus::Paid));
    }
}
