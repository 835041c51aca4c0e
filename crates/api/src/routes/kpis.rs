use axum::routing::get;
use axum::Router;

use crate::handlers::kpis;
use crate::state::AppState;

/// Routes mounted at `/kpis`.
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
        .route("/", get(kpis::list).post(kpis::create))
        .route(
            "/{id}",
            get(kpis::get_by_id)
                .patch(kpis::update)
                .put(kpis::update)
                .delete(kpis::delete),
        )
}
