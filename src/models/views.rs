use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for labels and fields the cluster did not report.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterInfo {
    pub cluster_name: String,
    pub region: String,
    pub namespace_count: usize,
    pub namespaces: Vec<String>,
}

impl ClusterInfo {
    pub fn new(cluster_name: String, region: String, namespaces: Vec<String>) -> Self {
        Self {
            cluster_name,
            region,
            namespace_count: namespaces.len(),
            namespaces,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSummary {
    pub name: String,
    pub ready: bool,
    pub instance_type: String,
    pub zone: String,
    /// True when the instance type differs from the baseline node group.
    /// A heuristic for autoscaler-provisioned nodes, not a cluster label.
    pub likely_autoscaled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeListing {
    pub node_count: usize,
    pub nodes: Vec<NodeSummary>,
    pub managed_only: bool,
    pub baseline_instance_type: String,
}

impl NodeListing {
    pub fn new(nodes: Vec<NodeSummary>, managed_only: bool, baseline_instance_type: String) -> Self {
        Self {
            node_count: nodes.len(),
            nodes,
            managed_only,
            baseline_instance_type,
        }
    }

    pub fn ready_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.ready).count()
    }

    pub fn likely_autoscaled_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.likely_autoscaled).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn parse(phase: Option<&str>) -> Self {
        match phase {
            Some("Pending") => Self::Pending,
            Some("Running") => Self::Running,
            Some("Succeeded") => Self::Succeeded,
            Some("Failed") => Self::Failed,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PodSummary {
    pub name: String,
    pub phase: PodPhase,
    /// Number of pod conditions of type Ready with status True (0 or 1).
    /// This is not a per-container count.
    pub ready: u32,
    pub restart_count: u32,
}

impl PodSummary {
    pub fn is_healthy(&self) -> bool {
        self.phase == PodPhase::Running && self.ready > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PodListing {
    pub namespace: String,
    pub pod_count: usize,
    pub pods: Vec<PodSummary>,
}

impl PodListing {
    pub fn new(namespace: String, pods: Vec<PodSummary>) -> Self {
        Self {
            namespace,
            pod_count: pods.len(),
            pods,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentSummary {
    pub name: String,
    pub replicas: u32,
    pub ready_replicas: u32,
    pub available_replicas: u32,
}

impl DeploymentSummary {
    pub fn fully_available(&self) -> bool {
        self.ready_replicas == self.replicas && self.available_replicas == self.replicas
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentListing {
    pub namespace: String,
    pub deployment_count: usize,
    pub deployments: Vec<DeploymentSummary>,
}

impl DeploymentListing {
    pub fn new(namespace: String, deployments: Vec<DeploymentSummary>) -> Self {
        Self {
            namespace,
            deployment_count: deployments.len(),
            deployments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthStatus {
    pub status: Health,
    pub api_reachable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: Health::Healthy,
            api_reachable: true,
            error: None,
            checked_at: Utc::now(),
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: Health::Unhealthy,
            api_reachable: false,
            error: Some(error.into()),
            checked_at: Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == Health::Healthy
    }
}
