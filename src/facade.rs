use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::clients::{ClusterApi, ProbeOutcome};
use crate::config::Config;
use crate::error::QueryError;
use crate::models::k8s;
use crate::models::views::{
    ClusterInfo, DeploymentListing, HealthStatus, NodeListing, PodListing,
};

/// The logical queries both transports expose.
#[async_trait]
pub trait ClusterQueries: Send + Sync {
    async fn cluster_info(&self) -> Result<ClusterInfo, QueryError>;

    /// With `managed_only`, drops nodes running the baseline instance type.
    /// That filter approximates "provisioned by the autoscaler"; it does not
    /// read any autoscaler label.
    async fn node_summary(&self, managed_only: bool) -> Result<NodeListing, QueryError>;

    async fn pod_summary(&self, namespace: &str) -> Result<PodListing, QueryError>;

    async fn deployment_summary(&self, namespace: &str) -> Result<DeploymentListing, QueryError>;

    /// Reports problems as data; never fails.
    async fn health(&self) -> HealthStatus;
}

pub struct QueryFacade {
    api: Arc<dyn ClusterApi>,
    cluster_name: String,
    region: String,
    baseline_instance_type: String,
}

impl QueryFacade {
    pub fn new(api: Arc<dyn ClusterApi>, config: &Config) -> Self {
        Self {
            api,
            cluster_name: config.cluster_name.clone(),
            region: config.region.clone(),
            baseline_instance_type: config.baseline_instance_type.clone(),
        }
    }
}

/// RFC 1123 label: lowercase alphanumerics and '-', 1 to 63 characters,
/// starting and ending with an alphanumeric.
pub fn validate_namespace(namespace: &str) -> Result<(), QueryError> {
    let bytes = namespace.as_bytes();
    let valid = !bytes.is_empty()
        && bytes.len() <= 63
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && bytes.first().is_some_and(u8::is_ascii_alphanumeric)
        && bytes.last().is_some_and(u8::is_ascii_alphanumeric);

    if valid {
        Ok(())
    } else {
        Err(QueryError::InvalidNamespace(namespace.to_string()))
    }
}

#[async_trait]
impl ClusterQueries for QueryFacade {
    async fn cluster_info(&self) -> Result<ClusterInfo, QueryError> {
        let namespaces = self.api.list_namespaces().await?;
        Ok(ClusterInfo::new(
            self.cluster_name.clone(),
            self.region.clone(),
            namespaces,
        ))
    }

    async fn node_summary(&self, managed_only: bool) -> Result<NodeListing, QueryError> {
        let nodes = self
            .api
            .list_nodes()
            .await?
            .iter()
            .map(|n| k8s::node_summary(n, &self.baseline_instance_type))
            .filter(|n| !managed_only || n.likely_autoscaled)
            .collect();
        Ok(NodeListing::new(
            nodes,
            managed_only,
            self.baseline_instance_type.clone(),
        ))
    }

    async fn pod_summary(&self, namespace: &str) -> Result<PodListing, QueryError> {
        validate_namespace(namespace)?;
        let pods = self
            .api
            .list_pods(namespace)
            .await
            .map_err(|e| e.in_namespace(namespace))?;
        Ok(PodListing::new(
            namespace.to_string(),
            pods.iter().map(k8s::pod_summary).collect(),
        ))
    }

    async fn deployment_summary(&self, namespace: &str) -> Result<DeploymentListing, QueryError> {
        validate_namespace(namespace)?;
        let deployments = self
            .api
            .list_deployments(namespace)
            .await
            .map_err(|e| e.in_namespace(namespace))?;
        Ok(DeploymentListing::new(
            namespace.to_string(),
            deployments.iter().map(k8s::deployment_summary).collect(),
        ))
    }

    async fn health(&self) -> HealthStatus {
        match self.api.probe_health().await {
            ProbeOutcome::Reachable => HealthStatus::healthy(),
            ProbeOutcome::Unreachable(detail) => {
                warn!("cluster unhealthy: {}", detail);
                HealthStatus::unhealthy(detail)
            }
        }
    }
}
