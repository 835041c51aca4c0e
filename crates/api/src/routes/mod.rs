pub mod auth;
pub mod clients;
pub mod contracts;
pub mod health;
pub mod industries;
pub mod kpis;
pub mod roles;
pub mod service_assignments;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /auth/login                                      login (public)
/// /auth/me                                         current user
///
/// /clients                                         list, create
/// /clients/{id}                                    get, update, delete
/// /clients/{client_id}/contracts                   list, create
/// /clients/{client_id}/contracts/{id}              get, update, delete
/// /clients/{client_id}/contracts/{id}/renew        renew (POST)
/// /clients/{client_id}/contracts/{id}/terminate    terminate (POST)
///
/// /contracts                                       list across clients
///
/// /industries                                      list, create
/// /industries/{id}                                 get, update, delete
///
/// /kpis                                            list, create
/// /kpis/{id}                                       get, update, delete
///
/// /service-assignments                             list, create
/// /service-assignments/{id}                        get, update, delete
///
/// /roles                                           list, create
/// /roles/{id}                                      get, update, delete
///
/// /users                                           list, create
/// /users/{id}                                      get, update, delete
/// ```
///
/// Updates accept both PATCH and PUT with partial-update semantics.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/clients", clients::router())
        .nest("/contracts", contracts::router())
        .nest("/industries", industries::router())
        .nest("/kpis", kpis::router())
        .nest("/service-assignments", service_assignments::router())
        .nest("/roles", roles::router())
        .nest("/users", users::router())
}
