pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::require_api_key;
use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/analyze-blogs", post(handlers::handle_analyze_blogs))
        .route(
            "/recommend-keywords",
            post(handlers::handle_recommend_keywords),
        )
        .route("/analyze-draft", post(handlers::handle_analyze_draft))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .nest("/api/v1", api)
        .with_state(state)
}
