//! Repository for the `users` table.

use clientdesk_core::listing::{FilterKind, SortDirection};
use clientdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{self, CreateUser, UpdateUser, User, UserCredentials, UserRow};
use crate::provider::{FilterColumn, Provider, ProviderConfig, SortColumn};

pub static USER_PROVIDER: Provider<UserRow, User> = Provider::new(ProviderConfig {
    entity: "User",
    table: "users",
    select: "u.id, u.email, u.name, u.role_id, u.is_active, u.last_login_at, u.created_at, \
             u.updated_at, r.name AS role_name",
    from: "users u JOIN roles r ON r.id = u.role_id",
    id_column: "u.id",
    search_columns: &["u.name", "u.email"],
    filters: &[
        FilterColumn::eq("roleId", "u.role_id", FilterKind::Id),
        FilterColumn::eq("isActive", "u.is_active", FilterKind::Bool),
    ],
    sort_columns: &[
        SortColumn::new("name", "u.name"),
        SortColumn::new("email", "u.email"),
        SortColumn::new("lastLoginAt", "u.last_login_at"),
        SortColumn::new("createdAt", "u.created_at"),
    ],
    default_sort: ("createdAt", SortDirection::Desc),
    transform: user::transform,
});

pub struct UserRepo;

impl UserRepo {
    /// Insert a user, returning it without the password hash.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO users (email, name, password_hash, role_id, is_active)
             VALUES ($1, $2, $3, $4, COALESCE($5, true))
             RETURNING id",
        )
        .bind(input.email.trim())
        .bind(input.name.trim())
        .bind(&input.password_hash)
        .bind(input.role_id)
        .bind(input.is_active)
        .fetch_one(pool)
        .await?;

        USER_PROVIDER.get(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let updated: Option<DbId> = sqlx::query_scalar(
            "UPDATE users SET
                email = COALESCE($2, email),
                name = COALESCE($3, name),
                password_hash = COALESCE($4, password_hash),
                role_id = COALESCE($5, role_id),
                is_active = COALESCE($6, is_active)
             WHERE id = $1
             RETURNING id",
        )
        .bind(id)
        .bind(input.email.as_deref().map(str::trim))
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.password_hash)
        .bind(input.role_id)
        .bind(input.is_active)
        .fetch_optional(pool)
        .await?;

        match updated {
            Some(id) => USER_PROVIDER.get(pool, id).await,
            None => Ok(None),
        }
    }

    /// Load login credentials and the role's permissions by email
    /// (case-insensitive).
    pub async fn find_credentials_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<UserCredentials>, sqlx::Error> {
        sqlx::query_as::<_, UserCredentials>(
            "SELECT u.id, u.email, u.password_hash, u.is_active,
                    r.name AS role_name, r.permissions
             FROM users u JOIN roles r ON r.id = u.role_id
             WHERE LOWER(u.email) = LOWER($1)",
        )
        .bind(email.trim())
        .fetch_optional(pool)
        .await
    }

    /// Record a successful login by setting `last_login_at` to now.
    pub async fn record_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
