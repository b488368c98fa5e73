// API module - HTTP endpoints

pub mod cards;
pub mod health;
pub mod middleware;
pub mod trainings;
pub mod verification;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::trace::TraceLayer;

use self::middleware::{auth::require_operator, state::AppState};

/// Builds the full application router.
///
/// Verification pages and the health check are public; everything else
/// needs the operator token.
pub fn app(state: AppState) -> Router {
    let operator_routes = Router::new()
        .merge(trainings::router())
        .merge(cards::router())
        .route_layer(from_fn_with_state(state.clone(), require_operator));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(verification::router())
        .merge(operator_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
