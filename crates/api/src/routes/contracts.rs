use axum::routing::get;
use axum::Router;

use crate::handlers::contracts;
use crate::state::AppState;

/// Routes mounted at `/contracts`. Read-only; writes go through the owning
/// client.
///
/// ```text
/// GET    /    -> list_all
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(contracts::list_all))
}
