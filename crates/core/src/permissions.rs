//! Permission names and matching.
//!
//! Permissions are `resource:action` strings stored on roles. `*` grants
//! everything and `resource:*` grants every action on one resource.

pub const ALL: &str = "*";

pub const CLIENTS_READ: &str = "clients:read";
pub const CLIENTS_WRITE: &str = "clients:write";
pub const CLIENTS_DELETE: &str = "clients:delete";

pub const CONTRACTS_READ: &str = "contracts:read";
pub const CONTRACTS_WRITE: &str = "contracts:write";
pub const CONTRACTS_DELETE: &str = "contracts:delete";

pub const INDUSTRIES_READ: &str = "industries:read";
pub const INDUSTRIES_WRITE: &str = "industries:write";
pub const INDUSTRIES_DELETE: &str = "industries:delete";

pub const KPIS_READ: &str = "kpis:read";
pub const KPIS_WRITE: &str = "kpis:write";
pub const KPIS_DELETE: &str = "kpis:delete";

pub const ASSIGNMENTS_READ: &str = "assignments:read";
pub const ASSIGNMENTS_WRITE: &str = "assignments:write";
pub const ASSIGNMENTS_DELETE: &str = "assignments:delete";

pub const ROLES_READ: &str = "roles:read";
pub const ROLES_WRITE: &str = "roles:write";
pub const ROLES_DELETE: &str = "roles:delete";

pub const USERS_READ: &str = "users:read";
pub const USERS_WRITE: &str = "users:write";
pub const USERS_DELETE: &str = "users:delete";

/// Whether `granted` satisfies `required`.
pub fn grants<S: AsRef<str>>(granted: &[S], required: &str) -> bool {
    let resource = required.split_once(':').map(|(r, _)| r);
    granted.iter().any(|g| {
        let g = g.as_ref();
        g == ALL
            || g == required
            || matches!((g.split_once(':'), resource), (Some((r, "*")), Some(req)) if r == req)
    })
}
