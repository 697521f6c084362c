pub mod auth;
pub mod config;
pub mod error;
pub mod flex;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod scope;
pub mod state;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let config = config::config();

    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Blog resources (dynamic serialization surface)
        .merge(blog_routes(state.clone()))
        // Protected
        .merge(auth_routes(state));

    if config.security.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

fn blog_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/blog/articles", get(handlers::blog::article_list))
        .route("/api/blog/articles/search", post(handlers::blog::article_search))
        .route("/api/blog/articles/:id", get(handlers::blog::article_get))
        .with_state(state)
}

fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/whoami", get(handlers::auth::whoami))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::jwt_auth_middleware,
        ))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "flexfields",
        "description": "Dynamic field expansion and sparse fieldsets for JSON APIs",
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "success": true, "status": "healthy" }))
}
