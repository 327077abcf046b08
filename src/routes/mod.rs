pub mod api;
pub mod mcp;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::handle_health))
        .route("/cluster-info", get(api::handle_cluster_info))
        .route("/nodes", get(api::handle_nodes))
        .route("/pods", get(api::handle_pods))
        .route("/deployments", get(api::handle_deployments))
        .route("/mcp", post(mcp::handle_mcp))
        .fallback(api::handle_not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
