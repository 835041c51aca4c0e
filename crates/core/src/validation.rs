//! Field validation helpers shared by request DTOs.
//!
//! Custom validators here plug into `#[derive(Validate)]` via
//! `#[validate(custom(function = "..."))]`.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use validator::{ValidationError, ValidationErrors};

use crate::error::FieldError;
use crate::types::Date;

/// Minimum length of a contract termination reason after trimming.
pub const MIN_TERMINATION_REASON_LENGTH: usize = 3;

/// Key `validator` uses for struct-level (schema) errors.
const SCHEMA_KEY: &str = "__all__";

/// Flatten `validator` output into a sorted list of [`FieldError`]s.
///
/// Field names are reported in camelCase to match request bodies.
/// Schema-level errors are attributed to the field named by their `field`
/// param, so cross-field rules (e.g. date order) still point at a field.
pub fn collect_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        let field = camel_case(&field);
        for err in field_errors {
            let name = if field == SCHEMA_KEY {
                err.params
                    .get("field")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| field.clone())
            } else {
                field.clone()
            };
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({})", err.code));
            out.push(FieldError::new(name, message));
        }
    }
    out.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    out
}

fn camel_case(name: &str) -> String {
    if name == SCHEMA_KEY {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Build a schema-level error attributed to `field`.
pub fn schema_error(code: &'static str, field: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code).with_message(Cow::Borrowed(message));
    err.add_param(Cow::Borrowed("field"), &field);
    err
}

/// ISO 4217-shaped currency code: exactly three ASCII uppercase letters.
pub fn validate_currency(value: &str) -> Result<(), ValidationError> {
    if value.len() == 3 && value.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ValidationError::new("currency")
            .with_message(Cow::Borrowed("Currency must be a 3-letter uppercase code")))
    }
}

/// Reject strings that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank").with_message(Cow::Borrowed("Must not be blank")))
    } else {
        Ok(())
    }
}

/// Permission strings are `resource:action` or the `*` wildcard.
pub fn validate_permissions(values: &[String]) -> Result<(), ValidationError> {
    let malformed = values.iter().any(|p| {
        p != crate::permissions::ALL
            && !matches!(p.split_once(':'), Some((r, a)) if !r.is_empty() && !a.is_empty())
    });
    if malformed {
        Err(ValidationError::new("permission")
            .with_message(Cow::Borrowed("Permissions must look like 'resource:action' or '*'")))
    } else {
        Ok(())
    }
}

/// Parse a calendar date from `YYYY-MM-DD` or a full RFC 3339 timestamp.
///
/// Timestamps are reduced to their UTC date.
pub fn parse_date(value: &str) -> Option<Date> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc).date_naive())
}

/// Serde helpers accepting the same date shapes as [`parse_date`].
///
/// Use with `#[serde(deserialize_with = "flexible_date::required")]` or
/// `#[serde(default, deserialize_with = "flexible_date::optional")]`.
pub mod flexible_date {
    use super::*;

    pub fn required<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("'{raw}' is not a date (expected YYYY-MM-DD)"))
        })
    }

    pub fn optional<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => parse_date(&raw).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!("'{raw}' is not a date (expected YYYY-MM-DD)"))
            }),
        }
    }
}
