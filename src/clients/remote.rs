use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;

use crate::error::{ErrorBody, QueryError};
use crate::facade::{validate_namespace, ClusterQueries};
use crate::models::views::{
    ClusterInfo, DeploymentListing, HealthStatus, NodeListing, PodListing,
};

/// Answers queries by calling the HTTP API of another running instance,
/// for MCP clients that cannot reach the cluster directly.
pub struct RemoteClient {
    pub address: String,
    http: Client,
}

impl RemoteClient {
    pub fn new(address: String, timeout: Duration) -> Result<Self, QueryError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QueryError::Configuration(format!("creating HTTP client: {}", e)))?;

        Ok(Self {
            address: address.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, QueryError> {
        let resp = self
            .http
            .get(format!("{}{}", self.address, path))
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| QueryError::upstream(format!("GET {} failed: {}", path, e)))?;

        let status = resp.status();
        if status.is_success() {
            return resp
                .json()
                .await
                .map_err(|e| QueryError::upstream(format!("GET {} returned bad body: {}", path, e)));
        }

        let body = resp.text().await.unwrap_or_default();
        Err(classify_failure(path, status, &body))
    }
}

fn classify_failure(path: &str, status: StatusCode, body: &str) -> QueryError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => err.into_query_error(),
        Err(_) => QueryError::upstream(format!("GET {} returned {}: {}", path, status, body)),
    }
}

#[async_trait]
impl ClusterQueries for RemoteClient {
    async fn cluster_info(&self) -> Result<ClusterInfo, QueryError> {
        self.get_json("/cluster-info", &[]).await
    }

    async fn node_summary(&self, managed_only: bool) -> Result<NodeListing, QueryError> {
        let flag = if managed_only { "true" } else { "false" };
        self.get_json("/nodes", &[("managed_only", flag)]).await
    }

    async fn pod_summary(&self, namespace: &str) -> Result<PodListing, QueryError> {
        validate_namespace(namespace)?;
        self.get_json("/pods", &[("namespace", namespace)]).await
    }

    async fn deployment_summary(&self, namespace: &str) -> Result<DeploymentListing, QueryError> {
        validate_namespace(namespace)?;
        self.get_json("/deployments", &[("namespace", namespace)])
            .await
    }

    async fn health(&self) -> HealthStatus {
        // An unhealthy instance answers 503 with a HealthStatus body.
        let resp = match self.http.get(format!("{}/health", self.address)).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("health check against {} failed: {}", self.address, e);
                return HealthStatus::unhealthy(format!("API unreachable: {}", e));
            }
        };

        let status = resp.status();
        match resp.json::<HealthStatus>().await {
            Ok(health) => health,
            Err(e) => HealthStatus::unhealthy(format!("health endpoint returned {}: {}", status, e)),
        }
    }
}
