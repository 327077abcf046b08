// Text rendering of query results for language-model clients.

use std::fmt::Write;

use crate::error::QueryError;
use crate::models::views::{
    ClusterInfo, DeploymentListing, HealthStatus, NodeListing, PodListing,
};

pub const FAILED: &str = "❌";
pub const OK: &str = "✅";
pub const WARN: &str = "⚠️";

pub fn failure(context: &str, err: &QueryError) -> String {
    format!("{FAILED} {context}: {err}")
}

pub fn cluster_status(info: &ClusterInfo, nodes: Option<&NodeListing>) -> String {
    let mut out = format!(
        "Cluster '{}' in {}\nNamespaces ({}): {}\n",
        info.cluster_name,
        info.region,
        info.namespace_count,
        info.namespaces.join(", ")
    );
    if let Some(nodes) = nodes {
        let _ = writeln!(
            out,
            "Nodes: {} total, {} ready",
            nodes.node_count,
            nodes.ready_count()
        );
        for n in &nodes.nodes {
            let _ = writeln!(
                out,
                "{} {}",
                if n.ready { OK } else { FAILED },
                n.name
            );
        }
    }
    out
}

pub fn health_report(health: &HealthStatus, info: Option<&ClusterInfo>, nodes: Option<&NodeListing>) -> String {
    if !health.is_healthy() {
        return format!(
            "{FAILED} Cluster health check failed: {}",
            health.error.as_deref().unwrap_or("unknown error")
        );
    }

    let mut out = match info {
        Some(info) => format!(
            "{OK} Cluster '{}' is healthy\n\nCluster: {} in {}\nNamespaces: {}\n",
            info.cluster_name, info.cluster_name, info.region, info.namespace_count
        ),
        None => format!("{OK} Cluster is healthy\n\n"),
    };
    if let Some(nodes) = nodes {
        let _ = writeln!(out, "Nodes: {} total", nodes.node_count);
        let _ = writeln!(out, "  • Ready nodes: {}", nodes.ready_count());
        let _ = writeln!(
            out,
            "  • Likely autoscaled (instance type != {}): {}",
            nodes.baseline_instance_type,
            nodes.likely_autoscaled_count()
        );
    }
    let _ = write!(out, "\nKubernetes API: accessible");
    out
}

pub fn node_info(nodes: &NodeListing) -> String {
    let qualifier = if nodes.managed_only {
        "likely autoscaled "
    } else {
        ""
    };
    let mut out = format!(
        "Your cluster has {} {}nodes:\n\n",
        nodes.node_count, qualifier
    );
    if nodes.managed_only {
        let _ = writeln!(
            out,
            "(heuristic: instance type differs from baseline {})\n",
            nodes.baseline_instance_type
        );
    }
    for n in &nodes.nodes {
        let _ = writeln!(out, "{} {}", if n.ready { OK } else { FAILED }, n.name);
        let _ = writeln!(out, "   • Type: {}", n.instance_type);
        let _ = writeln!(out, "   • Zone: {}", n.zone);
        let _ = writeln!(
            out,
            "   • Status: {}\n",
            if n.ready { "Ready" } else { "NotReady" }
        );
    }
    out
}

pub fn pod_list(pods: &PodListing, show_status: bool) -> String {
    let mut out = format!(
        "Pods in '{}' namespace: {} total\n\n",
        pods.namespace, pods.pod_count
    );
    if pods.pods.is_empty() {
        out.push_str("No pods found in this namespace.");
        return out;
    }
    for p in &pods.pods {
        if show_status {
            let _ = writeln!(
                out,
                "- {} ({}, ready {}/1, {} restarts)",
                p.name,
                p.phase.as_str(),
                p.ready,
                p.restart_count
            );
        } else {
            let _ = writeln!(out, "- {}", p.name);
        }
    }
    out
}

pub fn pod_check(pods: &PodListing) -> String {
    let mut out = format!(
        "Pods in '{}' namespace: {} total\n\n",
        pods.namespace, pods.pod_count
    );
    if pods.pods.is_empty() {
        out.push_str("No pods found in this namespace.");
        return out;
    }
    for p in &pods.pods {
        let _ = writeln!(out, "{} {}", if p.is_healthy() { OK } else { FAILED }, p.name);
        let _ = writeln!(out, "   • Phase: {}", p.phase.as_str());
        let _ = writeln!(out, "   • Ready: {}/1", p.ready);
        let _ = writeln!(out, "   • Restarts: {}\n", p.restart_count);
    }
    out
}

pub fn deployments(listing: &DeploymentListing) -> String {
    let mut out = format!(
        "Deployments in '{}' namespace: {} total\n\n",
        listing.namespace, listing.deployment_count
    );
    if listing.deployments.is_empty() {
        out.push_str("No deployments found in this namespace.");
        return out;
    }
    for d in &listing.deployments {
        let marker = if d.fully_available() { OK } else { WARN };
        let _ = writeln!(out, "{} {}", marker, d.name);
        let _ = writeln!(out, "   • Desired: {}", d.replicas);
        let _ = writeln!(out, "   • Ready: {}", d.ready_replicas);
        let _ = writeln!(out, "   • Available: {}\n", d.available_replicas);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::views::{DeploymentSummary, NodeSummary, PodPhase, PodSummary};

    #[test]
    fn partially_ready_deployment_is_flagged() {
        let listing = DeploymentListing::new(
            "default".into(),
            vec![
                DeploymentSummary {
                    name: "web".into(),
                    replicas: 3,
                    ready_replicas: 2,
                    available_replicas: 2,
                },
                DeploymentSummary {
                    name: "db".into(),
                    replicas: 1,
                    ready_replicas: 1,
                    available_replicas: 1,
                },
            ],
        );
        let text = deployments(&listing);
        assert!(text.starts_with("Deployments in 'default' namespace: 2 total"));
        assert!(text.contains("⚠️ web"));
        assert!(text.contains("✅ db"));
    }

    #[test]
    fn empty_namespace_says_so() {
        let text = pod_check(&PodListing::new("default".into(), vec![]));
        assert!(text.ends_with("No pods found in this namespace."));
    }

    #[test]
    fn pod_check_marks_unready_pods() {
        let listing = PodListing::new(
            "mcp-server".into(),
            vec![PodSummary {
                name: "mcp-0".into(),
                phase: PodPhase::Running,
                ready: 0,
                restart_count: 7,
            }],
        );
        let text = pod_check(&listing);
        assert!(text.contains("❌ mcp-0"));
        assert!(text.contains("Ready: 0/1"));
        assert!(text.contains("Restarts: 7"));

        let brief = pod_list(&listing, false);
        assert!(brief.contains("- mcp-0\n"));
        assert!(!brief.contains("restarts"));
    }

    #[test]
    fn managed_node_listing_names_the_heuristic() {
        let nodes = NodeListing::new(
            vec![NodeSummary {
                name: "spot-1".into(),
                ready: true,
                instance_type: "m5.large".into(),
                zone: "us-east-1b".into(),
                likely_autoscaled: true,
            }],
            true,
            "t3.medium".into(),
        );
        let text = node_info(&nodes);
        assert!(text.starts_with("Your cluster has 1 likely autoscaled nodes"));
        assert!(text.contains("heuristic"));
        assert!(text.contains("Type: m5.large"));
    }

    #[test]
    fn unhealthy_report_has_failure_marker() {
        let text = health_report(&HealthStatus::unhealthy("connection refused"), None, None);
        assert_eq!(text, "❌ Cluster health check failed: connection refused");
    }

    #[test]
    fn failure_prefix() {
        let err = QueryError::NotFound {
            namespace: "ghost".into(),
        };
        assert_eq!(
            failure("Error checking pods in ghost", &err),
            "❌ Error checking pods in ghost: namespace 'ghost' not found"
        );
    }
}
