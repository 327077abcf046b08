//! The fixed set of tools and resources. Adding or removing one is a change
//! to these enums, checked by every exhaustive match.

use serde::Deserialize;
use serde_json::{json, Value};

use super::protocol::{ResourceDefinition, ToolDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    GetClusterStatus,
    ListPods,
    GetDeployments,
    CheckClusterHealth,
    GetNodeInfo,
    CheckPods,
}

impl ToolName {
    pub const ALL: [ToolName; 6] = [
        ToolName::GetClusterStatus,
        ToolName::ListPods,
        ToolName::GetDeployments,
        ToolName::CheckClusterHealth,
        ToolName::GetNodeInfo,
        ToolName::CheckPods,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetClusterStatus => "get_cluster_status",
            Self::ListPods => "list_pods",
            Self::GetDeployments => "get_deployments",
            Self::CheckClusterHealth => "check_cluster_health",
            Self::GetNodeInfo => "get_node_info",
            Self::CheckPods => "check_pods",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn definition(&self, default_namespace: &str) -> ToolDefinition {
        let namespace_prop = json!({
            "type": "string",
            "description": "Kubernetes namespace",
            "default": default_namespace,
        });

        let (description, properties) = match self {
            Self::GetClusterStatus => (
                "Get the current status of the cluster: name, region and namespaces",
                json!({
                    "include_nodes": {
                        "type": "boolean",
                        "description": "Include node readiness",
                        "default": false
                    }
                }),
            ),
            Self::ListPods => (
                "List pods in a namespace",
                json!({
                    "namespace": namespace_prop,
                    "show_status": {
                        "type": "boolean",
                        "description": "Include phase, readiness and restart counts",
                        "default": true
                    }
                }),
            ),
            Self::GetDeployments => (
                "Get deployments in a namespace with desired, ready and available replicas",
                json!({ "namespace": namespace_prop }),
            ),
            Self::CheckClusterHealth => (
                "Check whether the Kubernetes API is reachable and summarize the cluster",
                json!({}),
            ),
            Self::GetNodeInfo => (
                "Get cluster nodes with readiness, instance type and zone. \
                 managed_only keeps nodes whose instance type differs from the \
                 baseline node group, a heuristic for autoscaler-managed nodes",
                json!({
                    "managed_only": {
                        "type": "boolean",
                        "description": "Only nodes that look autoscaler-managed (instance type heuristic)",
                        "default": false
                    }
                }),
            ),
            Self::CheckPods => (
                "Check pod health in a namespace",
                json!({ "namespace": namespace_prop }),
            ),
        };

        ToolDefinition {
            name: self.as_str(),
            description,
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "additionalProperties": false
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClusterStatusArgs {
    #[serde(default)]
    include_nodes: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListPodsArgs {
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default = "default_true")]
    show_status: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NamespaceArgs {
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeInfoArgs {
    #[serde(default, alias = "include_karpenter_only")]
    managed_only: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

fn default_true() -> bool {
    true
}

/// A validated tool invocation. Namespaces are already defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    GetClusterStatus { include_nodes: bool },
    ListPods { namespace: String, show_status: bool },
    GetDeployments { namespace: String },
    CheckClusterHealth,
    GetNodeInfo { managed_only: bool },
    CheckPods { namespace: String },
}

impl ToolCall {
    pub fn parse(
        name: &str,
        arguments: Option<Value>,
        default_namespace: &str,
    ) -> Result<Self, String> {
        let tool = ToolName::parse(name).ok_or_else(|| format!("Unknown tool: {name}"))?;
        // Some clients send null for "no arguments".
        let args = match arguments {
            None | Some(Value::Null) => json!({}),
            Some(v) => v,
        };
        let or_default = |ns: Option<String>| ns.unwrap_or_else(|| default_namespace.to_string());

        let call = match tool {
            ToolName::GetClusterStatus => {
                let a: ClusterStatusArgs = from_args(name, args)?;
                Self::GetClusterStatus {
                    include_nodes: a.include_nodes,
                }
            }
            ToolName::ListPods => {
                let a: ListPodsArgs = from_args(name, args)?;
                Self::ListPods {
                    namespace: or_default(a.namespace),
                    show_status: a.show_status,
                }
            }
            ToolName::GetDeployments => {
                let a: NamespaceArgs = from_args(name, args)?;
                Self::GetDeployments {
                    namespace: or_default(a.namespace),
                }
            }
            ToolName::CheckClusterHealth => {
                let _: NoArgs = from_args(name, args)?;
                Self::CheckClusterHealth
            }
            ToolName::GetNodeInfo => {
                let a: NodeInfoArgs = from_args(name, args)?;
                Self::GetNodeInfo {
                    managed_only: a.managed_only,
                }
            }
            ToolName::CheckPods => {
                let a: NamespaceArgs = from_args(name, args)?;
                Self::CheckPods {
                    namespace: or_default(a.namespace),
                }
            }
        };
        Ok(call)
    }
}

fn from_args<T: serde::de::DeserializeOwned>(tool: &str, args: Value) -> Result<T, String> {
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments for {tool}: {e}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceUri {
    ClusterInfo,
    Health,
    NodeInfo,
    ClusterStatus,
    PodStatus,
}

impl ResourceUri {
    pub const ALL: [ResourceUri; 5] = [
        ResourceUri::ClusterInfo,
        ResourceUri::Health,
        ResourceUri::NodeInfo,
        ResourceUri::ClusterStatus,
        ResourceUri::PodStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClusterInfo => "resource://cluster-info",
            Self::Health => "resource://health",
            Self::NodeInfo => "resource://node-info",
            Self::ClusterStatus => "resource://cluster-status",
            Self::PodStatus => "resource://pod-status",
        }
    }

    pub fn parse(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == uri)
    }

    pub fn definition(&self) -> ResourceDefinition {
        let (name, description) = match self {
            Self::ClusterInfo => ("Cluster Information", "Cluster name, region and live namespace list"),
            Self::Health => ("Health Check", "Kubernetes API reachability"),
            Self::NodeInfo => ("Node Information", "Nodes with readiness, instance type and zone"),
            Self::ClusterStatus => ("Cluster Status", "Cluster information, nodes and health in one document"),
            Self::PodStatus => ("Pod Status", "Pod listings for the watched namespaces"),
        };
        ResourceDefinition {
            uri: self.as_str(),
            name,
            description,
            mime_type: "application/json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(ToolName::parse(tool.as_str()), Some(tool));
        }
        for res in ResourceUri::ALL {
            assert_eq!(ResourceUri::parse(res.as_str()), Some(res));
        }
        assert_eq!(ToolName::parse("delete_pod"), None);
        assert_eq!(ResourceUri::parse("resource://secrets"), None);
    }

    #[test]
    fn namespace_defaults_to_configured_value() {
        let call = ToolCall::parse("check_pods", None, "default").unwrap();
        assert_eq!(
            call,
            ToolCall::CheckPods {
                namespace: "default".into()
            }
        );

        let call = ToolCall::parse("list_pods", Some(json!({"namespace": "kube-system"})), "default")
            .unwrap();
        assert_eq!(
            call,
            ToolCall::ListPods {
                namespace: "kube-system".into(),
                show_status: true
            }
        );
    }

    #[test]
    fn karpenter_alias_is_accepted() {
        let call = ToolCall::parse(
            "get_node_info",
            Some(json!({"include_karpenter_only": true})),
            "default",
        )
        .unwrap();
        assert_eq!(call, ToolCall::GetNodeInfo { managed_only: true });
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        let err = ToolCall::parse(
            "get_deployments",
            Some(json!({"namespace": "default", "replicas": 3})),
            "default",
        )
        .unwrap_err();
        assert!(err.starts_with("Invalid arguments for get_deployments"));

        let err = ToolCall::parse("check_cluster_health", Some(json!({"verbose": true})), "default")
            .unwrap_err();
        assert!(err.contains("check_cluster_health"));
    }

    #[test]
    fn unknown_tool() {
        assert_eq!(
            ToolCall::parse("scale_deployment", None, "default").unwrap_err(),
            "Unknown tool: scale_deployment"
        );
    }

    #[test]
    fn definitions_advertise_the_namespace_default() {
        let def = ToolName::CheckPods.definition("mcp-server");
        assert_eq!(def.name, "check_pods");
        assert_eq!(
            def.input_schema["properties"]["namespace"]["default"],
            "mcp-server"
        );
        assert_eq!(def.input_schema["additionalProperties"], false);
    }
}
