// Field extraction from raw Kubernetes API records into the summary views.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Node, Pod};

use super::views::{DeploymentSummary, NodeSummary, PodPhase, PodSummary, UNKNOWN};

pub const INSTANCE_TYPE_LABEL: &str = "node.kubernetes.io/instance-type";
pub const ZONE_LABEL: &str = "topology.kubernetes.io/zone";

fn label_or_unknown(node: &Node, key: &str) -> String {
    node.metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(key))
        .cloned()
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn name_or_unknown(name: &Option<String>) -> String {
    name.clone().unwrap_or_else(|| UNKNOWN.to_string())
}

fn non_negative(n: i32) -> u32 {
    u32::try_from(n).unwrap_or(0)
}

pub fn node_is_ready(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
}

pub fn node_summary(node: &Node, baseline_instance_type: &str) -> NodeSummary {
    let instance_type = label_or_unknown(node, INSTANCE_TYPE_LABEL);
    NodeSummary {
        name: name_or_unknown(&node.metadata.name),
        ready: node_is_ready(node),
        likely_autoscaled: instance_type != baseline_instance_type,
        zone: label_or_unknown(node, ZONE_LABEL),
        instance_type,
    }
}

pub fn pod_summary(pod: &Pod) -> PodSummary {
    let status = pod.status.as_ref();

    let ready = status
        .and_then(|s| s.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .filter(|c| c.type_ == "Ready" && c.status == "True")
                .count() as u32
        })
        .unwrap_or(0);

    let restart_count = status
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| statuses.iter().map(|cs| non_negative(cs.restart_count)).sum())
        .unwrap_or(0);

    PodSummary {
        name: name_or_unknown(&pod.metadata.name),
        phase: PodPhase::parse(status.and_then(|s| s.phase.as_deref())),
        ready,
        restart_count,
    }
}

pub fn deployment_summary(deployment: &Deployment) -> DeploymentSummary {
    let status = deployment.status.as_ref();
    DeploymentSummary {
        name: name_or_unknown(&deployment.metadata.name),
        // The API server defaults an unset replica count to 1.
        replicas: deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .map(non_negative)
            .unwrap_or(1),
        ready_replicas: status
            .and_then(|s| s.ready_replicas)
            .map(non_negative)
            .unwrap_or(0),
        available_replicas: status
            .and_then(|s| s.available_replicas)
            .map(non_negative)
            .unwrap_or(0),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::api::core::v1::{Node, Pod};
    use serde_json::json;

    pub fn node(name: &str, ready: bool, instance_type: Option<&str>, zone: Option<&str>) -> Node {
        let mut labels = serde_json::Map::new();
        if let Some(t) = instance_type {
            labels.insert(super::INSTANCE_TYPE_LABEL.into(), json!(t));
        }
        if let Some(z) = zone {
            labels.insert(super::ZONE_LABEL.into(), json!(z));
        }
        serde_json::from_value(json!({
            "metadata": {"name": name, "labels": labels},
            "status": {"conditions": [
                {"type": "MemoryPressure", "status": "False"},
                {"type": "Ready", "status": if ready { "True" } else { "False" }}
            ]}
        }))
        .unwrap()
    }

    pub fn pod(name: &str, phase: &str, ready: bool, restarts: &[i32]) -> Pod {
        let statuses: Vec<_> = restarts
            .iter()
            .enumerate()
            .map(|(i, r)| {
                json!({
                    "name": format!("c{i}"),
                    "image": "busybox",
                    "imageID": "",
                    "ready": ready,
                    "restartCount": r
                })
            })
            .collect();
        serde_json::from_value(json!({
            "metadata": {"name": name},
            "status": {
                "phase": phase,
                "conditions": [
                    {"type": "Initialized", "status": "True"},
                    {"type": "Ready", "status": if ready { "True" } else { "False" }}
                ],
                "containerStatuses": statuses
            }
        }))
        .unwrap()
    }

    pub fn deployment(name: &str, replicas: Option<i32>, ready: Option<i32>, available: Option<i32>) -> Deployment {
        let mut status = serde_json::Map::new();
        if let Some(r) = ready {
            status.insert("readyReplicas".into(), json!(r));
        }
        if let Some(a) = available {
            status.insert("availableReplicas".into(), json!(a));
        }
        let mut spec = json!({
            "selector": {"matchLabels": {"app": name}},
            "template": {"metadata": {"labels": {"app": name}}}
        });
        if let Some(r) = replicas {
            spec["replicas"] = json!(r);
        }
        serde_json::from_value(json!({
            "metadata": {"name": name},
            "spec": spec,
            "status": status
        }))
        .unwrap()
    }
}
