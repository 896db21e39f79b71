pub mod analytics;
pub mod likes;
pub mod posts;
pub mod session;
pub mod users;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full HTTP surface, ready to serve.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(users::router(&state))
        .merge(session::router())
        .merge(posts::router(&state))
        .merge(likes::router(&state))
        .merge(analytics::router(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
