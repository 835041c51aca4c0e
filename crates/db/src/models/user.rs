//! User entity model and DTOs.

use clientdesk_core::types::{DbId, Timestamp};
use clientdesk_core::validation::validate_not_blank;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::RelationRef;

/// A `users` row joined with its role name. Carries no password hash.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: DbId,
    pub email: String,
    pub name: String,
    pub role_id: DbId,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub role_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub name: String,
    pub role_id: DbId,
    pub role: RelationRef,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub fn transform(row: UserRow) -> Result<User, sqlx::Error> {
    Ok(User {
        role: RelationRef {
            id: row.role_id,
            name: row.role_name,
        },
        id: row.id,
        email: row.email,
        name: row.name,
        role_id: row.role_id,
        is_active: row.is_active,
        last_login_at: row.last_login_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// What login needs: the hash plus the role's permissions.
///
/// Contains the password hash -- NEVER serialize this.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: DbId,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub role_name: String,
    pub permissions: Vec<String>,
}

/// Request body for creating a user. The password is hashed by the caller.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub role_id: DbId,
    pub is_active: Option<bool>,
}

/// Insert DTO with the password already hashed.
#[derive(Debug)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role_id: DbId,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email(message = "Must be a valid email address"))]
    pub email: Option<String>,
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: Option<String>,
    #[validate(range(min = 1, message = "Must be a positive id"))]
    pub role_id: Option<DbId>,
    pub is_active: Option<bool>,
}

/// Update DTO with any new password already hashed.
#[derive(Debug, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role_id: Option<DbId>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serialized_user_has_no_password_fields() {
        let user = User {
            id: 1,
            email: "a@example.com".into(),
            name: "A".into(),
            role_id: 2,
            role: RelationRef { id: 2, name: "viewer".into() },
            is_active: true,
            last_login_at: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["role"], json!({"id": 2, "name": "viewer"}));
        assert_eq!(value["roleId"], 2);
    }

    #[test]
    fn short_password_is_rejected() {
        let input: CreateUserRequest = serde_json::from_value(json!({
            "email": "a@example.com",
            "name": "A",
            "password": "short",
            "roleId": 1
        }))
        .unwrap();
        assert!(input.validate().unwrap_err().field_errors().contains_key("password"));
    }
}
