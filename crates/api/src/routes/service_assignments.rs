use axum::routing::get;
use axum::Router;

use crate::handlers::service_assignments;
use crate::state::AppState;

/// Routes mounted at `/service-assignments`.
///
/// ```text
/// GET    /        -> list
/// POST   /        -> create
/// GET    /{id}    -> get_by_id
/// PATCH  /{id}    -> update
/// PUT    /{id}    -> update
/// DELETE /{id}    -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(service_assignments::list).post(service_assignments::create))
        .route(
            "/{id}",
            get(service_assignments::get_by_id)
                .patch(service_assignments::update)
                .put(service_assignments::update)
                .delete(service_assignments::delete),
        )
}
