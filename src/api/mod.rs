// API module - HTTP endpoints

use axum::Router;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod auth;
pub mod extract;
pub mod health;
pub mod items;
pub mod points;
pub mod state;
pub mod swaps;
pub mod users;

pub use state::AppState;

/// Full application router with request tracing
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(items::router())
        .merge(swaps::router())
        .merge(points::router())
        .merge(users::router())
        .merge(auth::router())
        .merge(admin::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
