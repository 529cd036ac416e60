//! API routes

use crate::api::handlers::{autocomplete, health_check, AppState};
use crate::auth::middleware::authenticate;
use axum::{middleware, routing::get, Router};

/// Build the API routes
pub fn build_api_routes(state: AppState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(health_check));

    // Protected routes: the token is verified before the handler runs
    let protected_routes = Router::new()
        .route("/autocomplete", get(autocomplete))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    public_routes
        .merge(protected_routes)
        .with_state(state)
}
