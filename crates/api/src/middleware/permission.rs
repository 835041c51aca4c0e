//! Permission-checking extractors.
//!
//! `Require<P>` authenticates the request and then checks a single
//! permission, so a handler states its requirement in its signature:
//!
//! ```ignore
//! async fn delete(auth: Require<ClientsDelete>, ...) -> AppResult<...> {
//!     tracing::info!(user_id = auth.user_id, "deleting");
//! }
//! ```

use std::marker::PhantomData;
use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use clientdesk_core::permissions;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// A permission name known at compile time.
pub trait Permission {
    const NAME: &'static str;
}

macro_rules! permission_markers {
    ($($marker:ident => $name:path),* $(,)?) => {
        $(
            pub struct $marker;

            impl Permission for $marker {
                const NAME: &'static str = $name;
            }
        )*
    };
}

permission_markers! {
    ClientsRead => permissions::CLIENTS_READ,
    ClientsWrite => permissions::CLIENTS_WRITE,
    ClientsDelete => permissions::CLIENTS_DELETE,
    ContractsRead => permissions::CONTRACTS_READ,
    ContractsWrite => permissions::CONTRACTS_WRITE,
    ContractsDelete => permissions::CONTRACTS_DELETE,
    IndustriesRead => permissions::INDUSTRIES_READ,
    IndustriesWrite => permissions::INDUSTRIES_WRITE,
    IndustriesDelete => permissions::INDUSTRIES_DELETE,
    KpisRead => permissions::KPIS_READ,
    KpisWrite => permissions::KPIS_WRITE,
    KpisDelete => permissions::KPIS_DELETE,
    AssignmentsRead => permissions::ASSIGNMENTS_READ,
    AssignmentsWrite => permissions::ASSIGNMENTS_WRITE,
    AssignmentsDelete => permissions::ASSIGNMENTS_DELETE,
    RolesRead => permissions::ROLES_READ,
    RolesWrite => permissions::ROLES_WRITE,
    RolesDelete => permissions::ROLES_DELETE,
    UsersRead => permissions::USERS_READ,
    UsersWrite => permissions::USERS_WRITE,
    UsersDelete => permissions::USERS_DELETE,
}

/// An authenticated user holding permission `P`.
///
/// Rejects with 401 when unauthenticated and 403 when the permission is
/// missing. Derefs to [`AuthUser`].
pub struct Require<P> {
    pub user: AuthUser,
    _permission: PhantomData<fn() -> P>,
}

impl<P> Deref for Require<P> {
    type Target = AuthUser;

    fn deref(&self) -> &AuthUser {
        &self.user
    }
}

impl<P: Permission> FromRequestParts<AppState> for Require<P> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.require(P::NAME)?;
        Ok(Require {
            user,
            _permission: PhantomData,
        })
    }
}
