//! Row models, API models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` row struct matching the provider's SELECT list
//! - A `Serialize` model returned by the API (camelCase, relations nested)
//! - `Deserialize` + `Validate` create and update DTOs
//! - The row -> model transform used by the resource's provider

use std::str::FromStr;

use clientdesk_core::error::CoreError;
use clientdesk_core::types::DbId;
use serde::Serialize;

pub mod audit;
pub mod client;
pub mod contract;
pub mod industry;
pub mod kpi;
pub mod role;
pub mod service_assignment;
pub mod user;

/// `{id, name}` summary of an eager-loaded relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationRef {
    pub id: DbId,
    pub name: String,
}

impl RelationRef {
    /// Build from LEFT JOIN columns; `None` when the join found nothing.
    pub fn from_join(id: Option<DbId>, name: Option<String>) -> Option<Self> {
        match (id, name) {
            (Some(id), Some(name)) => Some(Self { id, name }),
            _ => None,
        }
    }
}

/// Decode a TEXT column holding one of the core status enums.
pub(crate) fn decode_text_enum<T>(column: &str, value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = CoreError>,
{
    T::from_str(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
