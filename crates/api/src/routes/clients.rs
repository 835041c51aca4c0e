//! Route definitions for the `/clients` resource, including the contracts
//! nested under each client.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{clients, contracts};
use crate::state::AppState;

/// Routes mounted at `/clients`.
///
/// ```text
/// GET    /                                       -> list
/// POST   /                                       -> create
/// GET    /{id}                                   -> get_by_id
/// PATCH  /{id}                                   -> update
/// PUT    /{id}                                   -> update
/// DELETE /{id}                                   -> delete
///
/// GET    /{client_id}/contracts                  -> list
/// POST   /{client_id}/contracts                  -> create
/// GET    /{client_id}/contracts/{id}             -> get_by_id
/// PATCH  /{client_id}/contracts/{id}             -> update
/// PUT    /{client_id}/contracts/{id}             -> update
/// DELETE /{client_id}/contracts/{id}             -> delete
/// POST   /{client_id}/contracts/{id}/renew       -> renew
/// POST   /{client_id}/contracts/{id}/terminate   -> terminate
/// ```
pub fn router() -> Router<AppState> {
    let contract_routes = Router::new()
        .route("/", get(contracts::list).post(contracts::create))
        .route(
            "/{id}",
            get(contracts::get_by_id)
                .patch(contracts::update)
                .put(contracts::update)
                .delete(contracts::delete),
        )
        .route("/{id}/renew", post(contracts::renew))
        .route("/{id}/terminate", post(contracts::terminate));

    Router::new()
        .route("/", get(clients::list).post(clients::create))
        .route(
            "/{id}",
            get(clients::get_by_id)
                .patch(clients::update)
                .put(clients::update)
                .delete(clients::delete),
        )
        .nest("/{client_id}/contracts", contract_routes)
}
