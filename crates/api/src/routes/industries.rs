use axum::routing::get;
use axum::Router;

use crate::handlers::industries;
use crate::state::AppState;

/// Routes mounted at `/industries`.
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
        .route("/", get(industries::list).post(industries::create))
        .route(
            "/{id}",
            get(industries::get_by_id)
                .patch(industries::update)
                .put(industries::update)
                .delete(industries::delete),
        )
}
