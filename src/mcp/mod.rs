//! MCP server: JSON-RPC dispatch of the tool and resource catalog onto the
//! cluster queries. Served over stdio by the `mcp` and `bridge` commands and
//! over HTTP at `POST /mcp` by `serve`.

pub mod catalog;
pub mod format;
pub mod protocol;

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ErrorBody, QueryError};
use crate::facade::ClusterQueries;

use catalog::{ResourceUri, ToolCall, ToolName};
use protocol::{
    error_codes, CallToolParams, CallToolResult, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, ListResourcesResult, ListToolsResult, ReadResourceParams,
    ReadResourceResult, ResourceContents, JSONRPC_VERSION,
};

pub struct McpServer {
    queries: Arc<dyn ClusterQueries>,
    default_namespace: String,
    pod_status_namespaces: Vec<String>,
}

impl McpServer {
    pub fn new(queries: Arc<dyn ClusterQueries>, config: &Config) -> Self {
        Self {
            queries,
            default_namespace: config.default_namespace.clone(),
            pod_status_namespaces: config.pod_status_namespaces.clone(),
        }
    }

    /// Parses and handles one raw message. Returns `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(raw) {
            Ok(req) => self.handle(req).await,
            Err(e) => Some(JsonRpcResponse::error(
                None,
                error_codes::PARSE_ERROR,
                format!("Invalid JSON-RPC message: {e}"),
            )),
        }
    }

    pub async fn handle(&self, req: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("mcp request: {}", req.method);

        let Some(id) = req.id else {
            // Notifications get no reply, whatever the method.
            if req.method != "notifications/initialized" {
                debug!("ignoring notification {}", req.method);
            }
            return None;
        };
        let id = Some(id);

        if req.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                id,
                error_codes::INVALID_REQUEST,
                format!("Unsupported jsonrpc version {:?}", req.jsonrpc),
            ));
        }

        let result = match req.method.as_str() {
            "initialize" => to_value(&InitializeResult::current()),
            "ping" => Ok(json!({})),
            "tools/list" => to_value(&ListToolsResult {
                tools: ToolName::ALL
                    .iter()
                    .map(|t| t.definition(&self.default_namespace))
                    .collect(),
            }),
            "tools/call" => match parse_params::<CallToolParams>(req.params) {
                Ok(params) => to_value(&self.call_tool(params).await),
                Err(e) => Err((error_codes::INVALID_PARAMS, e)),
            },
            "resources/list" => to_value(&ListResourcesResult {
                resources: ResourceUri::ALL.iter().map(|r| r.definition()).collect(),
            }),
            "resources/read" => match parse_params::<ReadResourceParams>(req.params) {
                Ok(params) => match ResourceUri::parse(&params.uri) {
                    Some(resource) => to_value(&ReadResourceResult {
                        contents: vec![ResourceContents {
                            uri: params.uri,
                            mime_type: "application/json",
                            text: self.read_resource(resource).await,
                        }],
                    }),
                    None => Err((
                        error_codes::INVALID_PARAMS,
                        format!("Unknown resource: {}", params.uri),
                    )),
                },
                Err(e) => Err((error_codes::INVALID_PARAMS, e)),
            },
            other => Err((
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err((code, message)) => JsonRpcResponse::error(id, code, message),
        })
    }

    async fn call_tool(&self, params: CallToolParams) -> CallToolResult {
        match ToolCall::parse(&params.name, params.arguments, &self.default_namespace) {
            Ok(call) => self.execute(call).await,
            Err(message) => CallToolResult::error(format!("{} {}", format::FAILED, message)),
        }
    }

    pub async fn execute(&self, call: ToolCall) -> CallToolResult {
        let q = &self.queries;
        match call {
            ToolCall::GetClusterStatus { include_nodes } => {
                let info = match q.cluster_info().await {
                    Ok(info) => info,
                    Err(e) => return tool_failure("Error getting cluster status", &e),
                };
                let nodes = if include_nodes {
                    match q.node_summary(false).await {
                        Ok(nodes) => Some(nodes),
                        Err(e) => return tool_failure("Error getting node info", &e),
                    }
                } else {
                    None
                };
                CallToolResult::text(format::cluster_status(&info, nodes.as_ref()))
            }
            ToolCall::ListPods {
                namespace,
                show_status,
            } => match q.pod_summary(&namespace).await {
                Ok(pods) => CallToolResult::text(format::pod_list(&pods, show_status)),
                Err(e) => tool_failure(&format!("Error listing pods in {namespace}"), &e),
            },
            ToolCall::GetDeployments { namespace } => {
                match q.deployment_summary(&namespace).await {
                    Ok(listing) => CallToolResult::text(format::deployments(&listing)),
                    Err(e) => {
                        tool_failure(&format!("Error getting deployments in {namespace}"), &e)
                    }
                }
            }
            ToolCall::CheckClusterHealth => {
                let health = q.health().await;
                if !health.is_healthy() {
                    return CallToolResult::text(format::health_report(&health, None, None));
                }
                let (info, nodes) = tokio::join!(q.cluster_info(), q.node_summary(false));
                CallToolResult::text(format::health_report(
                    &health,
                    info.ok().as_ref(),
                    nodes.ok().as_ref(),
                ))
            }
            ToolCall::GetNodeInfo { managed_only } => match q.node_summary(managed_only).await {
                Ok(nodes) => CallToolResult::text(format::node_info(&nodes)),
                Err(e) => tool_failure("Error getting node info", &e),
            },
            ToolCall::CheckPods { namespace } => match q.pod_summary(&namespace).await {
                Ok(pods) => CallToolResult::text(format::pod_check(&pods)),
                Err(e) => tool_failure(&format!("Error checking pods in {namespace}"), &e),
            },
        }
    }

    /// Renders a resource as JSON text. Failed queries become error objects
    /// inside the document.
    pub async fn read_resource(&self, resource: ResourceUri) -> String {
        let q = &self.queries;
        let value = match resource {
            ResourceUri::ClusterInfo => result_value(q.cluster_info().await),
            ResourceUri::Health => json_value(&q.health().await),
            ResourceUri::NodeInfo => result_value(q.node_summary(false).await),
            ResourceUri::ClusterStatus => {
                let (info, nodes, health) =
                    tokio::join!(q.cluster_info(), q.node_summary(false), q.health());
                json!({
                    "cluster": result_value(info),
                    "nodes": result_value(nodes),
                    "health": json_value(&health),
                })
            }
            ResourceUri::PodStatus => {
                let listings =
                    join_all(self.pod_status_namespaces.iter().map(|ns| q.pod_summary(ns))).await;
                let by_namespace: Map<String, Value> = self
                    .pod_status_namespaces
                    .iter()
                    .cloned()
                    .zip(listings.into_iter().map(result_value))
                    .collect();
                Value::Object(by_namespace)
            }
        };
        serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!(r#"{{"error":"{e}"}}"#))
    }

    /// Serves newline-delimited JSON-RPC on stdin/stdout until stdin closes.
    pub async fn serve_stdio(&self) -> std::io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();
        info!("mcp server ready on stdio");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let Some(response) = self.handle_message(&line).await else {
                continue;
            };
            match serde_json::to_vec(&response) {
                Ok(mut bytes) => {
                    bytes.push(b'\n');
                    stdout.write_all(&bytes).await?;
                    stdout.flush().await?;
                }
                Err(e) => warn!("dropping unserializable response: {}", e),
            }
        }

        info!("stdin closed, mcp server exiting");
        Ok(())
    }
}

fn tool_failure(context: &str, err: &QueryError) -> CallToolResult {
    warn!("{}: {}", context, err);
    CallToolResult::error(format::failure(context, err))
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, String> {
    let params = params.ok_or_else(|| "Missing params".to_string())?;
    serde_json::from_value(params).map_err(|e| format!("Invalid params: {e}"))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, (i32, String)> {
    serde_json::to_value(value).map_err(|e| (error_codes::INTERNAL_ERROR, e.to_string()))
}

fn json_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| json!({ "error": e.to_string() }))
}

fn result_value<T: Serialize>(result: Result<T, QueryError>) -> Value {
    match result {
        Ok(v) => json_value(&v),
        Err(e) => json_value(&ErrorBody::from(&e)),
    }
}
