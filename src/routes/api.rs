use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::warn;

use crate::error::{ErrorBody, QueryError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NamespaceQuery {
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NodesQuery {
    #[serde(default)]
    pub managed_only: bool,
}

fn status_for(err: &QueryError) -> StatusCode {
    match err {
        QueryError::NotFound { .. } => StatusCode::NOT_FOUND,
        QueryError::InvalidNamespace(_) => StatusCode::BAD_REQUEST,
        QueryError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        QueryError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn error_response(err: QueryError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        warn!("query failed: {}", err);
    }
    (status, Json(ErrorBody::from(&err))).into_response()
}

fn bad_query(rejection: QueryRejection) -> Response {
    (
        rejection.status(),
        Json(ErrorBody {
            error: rejection.body_text(),
            code: "BAD_REQUEST".to_string(),
            namespace: None,
            detail: None,
        }),
    )
        .into_response()
}

impl NamespaceQuery {
    fn resolve(self, state: &AppState) -> String {
        self.namespace
            .unwrap_or_else(|| state.config.default_namespace.clone())
    }
}

pub async fn handle_health(State(state): State<AppState>) -> Response {
    let health = state.queries.health().await;
    let status = if health.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health)).into_response()
}

pub async fn handle_cluster_info(State(state): State<AppState>) -> Response {
    match state.queries.cluster_info().await {
        Ok(info) => Json(info).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn handle_nodes(
    State(state): State<AppState>,
    query: Result<Query<NodesQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_query(rejection),
    };
    match state.queries.node_summary(query.managed_only).await {
        Ok(nodes) => Json(nodes).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn handle_pods(
    State(state): State<AppState>,
    query: Result<Query<NamespaceQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_query(rejection),
    };
    let namespace = query.resolve(&state);
    match state.queries.pod_summary(&namespace).await {
        Ok(pods) => Json(pods).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn handle_deployments(
    State(state): State<AppState>,
    query: Result<Query<NamespaceQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_query(rejection),
    };
    let namespace = query.resolve(&state);
    match state.queries.deployment_summary(&namespace).await {
        Ok(deployments) => Json(deployments).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn handle_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "no such endpoint".to_string(),
            code: "NOT_FOUND".to_string(),
            namespace: None,
            detail: None,
        }),
    )
        .into_response()
}
