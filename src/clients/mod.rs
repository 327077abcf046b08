pub mod remote;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod};
use kube::api::{Api, ListParams};
use kube::config::KubeConfigOptions;
use kube::{Client, Config};
use tracing::{info, warn};

use crate::error::QueryError;

/// Outcome of the cheapest possible read against the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    Unreachable(String),
}

/// Raw read access to the cluster control plane.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn list_namespaces(&self) -> Result<Vec<String>, QueryError>;

    async fn list_nodes(&self) -> Result<Vec<Node>, QueryError>;

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, QueryError>;

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>, QueryError>;

    /// Never fails; any error is reported as `Unreachable`.
    async fn probe_health(&self) -> ProbeOutcome;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    InCluster,
    Kubeconfig,
}

/// Client over the Kubernetes API. Holds no client at all when credential
/// discovery failed; every call then reports a configuration error.
pub struct KubeClient {
    client: Result<Client, String>,
    timeout: Duration,
}

impl KubeClient {
    /// Resolves credentials (in-cluster service account first, local
    /// kubeconfig second) and builds the client. Call once per process.
    pub async fn initialize(timeout: Duration) -> Self {
        let client = match resolve_config().await {
            Ok((config, source)) => {
                info!(
                    "using {} credentials for {}",
                    match source {
                        CredentialSource::InCluster => "in-cluster",
                        CredentialSource::Kubeconfig => "kubeconfig",
                    },
                    config.cluster_url
                );
                Client::try_from(config).map_err(|e| format!("building client: {}", e))
            }
            Err(e) => Err(e),
        };

        if let Err(ref e) = client {
            warn!("no usable cluster credentials, running degraded: {}", e);
        }

        Self { client, timeout }
    }

    pub fn configuration_error(&self) -> Option<&str> {
        self.client.as_ref().err().map(String::as_str)
    }

    fn client(&self) -> Result<Client, QueryError> {
        self.client
            .clone()
            .map_err(QueryError::Configuration)
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, QueryError>
    where
        F: Future<Output = Result<T, kube::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| QueryError::upstream(e.to_string())),
            Err(_) => Err(self.timed_out()),
        }
    }

    /// Classifies a namespaced list failure. An upstream 404 means the
    /// namespace is gone.
    async fn namespaced_list<K, F>(&self, namespace: &str, fut: F) -> Result<Vec<K>, QueryError>
    where
        F: Future<Output = Result<kube::core::ObjectList<K>, kube::Error>>,
        K: Clone,
    {
        let items = match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(list)) => list.items,
            Ok(Err(kube::Error::Api(resp))) if resp.code == 404 => {
                return Err(QueryError::NotFound {
                    namespace: namespace.to_string(),
                });
            }
            Ok(Err(e)) => return Err(QueryError::upstream(e.to_string()).in_namespace(namespace)),
            Err(_) => return Err(self.timed_out().in_namespace(namespace)),
        };

        // Listing a missing namespace returns an empty list, not a 404.
        if items.is_empty() && !self.namespace_exists(namespace).await? {
            return Err(QueryError::NotFound {
                namespace: namespace.to_string(),
            });
        }
        Ok(items)
    }

    /// A 403 counts as present: the caller could list inside the namespace,
    /// it just may not read the Namespace object itself.
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, QueryError> {
        let api: Api<Namespace> = Api::all(self.client()?);
        match tokio::time::timeout(self.timeout, api.get_opt(namespace)).await {
            Ok(Ok(found)) => Ok(found.is_some()),
            Ok(Err(kube::Error::Api(resp))) if resp.code == 403 => Ok(true),
            Ok(Err(e)) => Err(QueryError::upstream(e.to_string()).in_namespace(namespace)),
            Err(_) => Err(self.timed_out().in_namespace(namespace)),
        }
    }

    fn timed_out(&self) -> QueryError {
        QueryError::upstream(format!(
            "request timed out after {}s",
            self.timeout.as_secs()
        ))
    }
}

async fn resolve_config() -> Result<(Config, CredentialSource), String> {
    match Config::incluster() {
        Ok(config) => return Ok((config, CredentialSource::InCluster)),
        Err(e) => info!("in-cluster config unavailable: {}", e),
    }

    Config::from_kubeconfig(&KubeConfigOptions::default())
        .await
        .map(|config| (config, CredentialSource::Kubeconfig))
        .map_err(|e| format!("loading kubeconfig: {}", e))
}

#[async_trait]
impl ClusterApi for KubeClient {
    async fn list_namespaces(&self) -> Result<Vec<String>, QueryError> {
        let api: Api<Namespace> = Api::all(self.client()?);
        let list = self.bounded(api.list(&ListParams::default())).await?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, QueryError> {
        let api: Api<Node> = Api::all(self.client()?);
        let list = self.bounded(api.list(&ListParams::default())).await?;
        Ok(list.items)
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, QueryError> {
        let api: Api<Pod> = Api::namespaced(self.client()?, namespace);
        let lp = ListParams::default();
        self.namespaced_list(namespace, api.list(&lp)).await
    }

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>, QueryError> {
        let api: Api<Deployment> = Api::namespaced(self.client()?, namespace);
        let lp = ListParams::default();
        self.namespaced_list(namespace, api.list(&lp)).await
    }

    async fn probe_health(&self) -> ProbeOutcome {
        let client = match self.client() {
            Ok(c) => c,
            Err(e) => return ProbeOutcome::Unreachable(e.to_string()),
        };
        let api: Api<Namespace> = Api::all(client);
        match self.bounded(api.list(&ListParams::default().limit(1))).await {
            Ok(_) => ProbeOutcome::Reachable,
            Err(e) => {
                warn!("health probe failed: {}", e);
                ProbeOutcome::Unreachable(e.to_string())
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn degraded() -> KubeClient {
        KubeClient {
            client: Err("loading kubeconfig: no such file".into()),
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn degraded_client_reports_configuration_error() {
        let c = degraded();
        assert_eq!(c.configuration_error(), Some("loading kubeconfig: no such file"));

        let err = c.list_namespaces().await.unwrap_err();
        assert!(matches!(err, QueryError::Configuration(_)));
        let err = c.list_pods("default").await.unwrap_err();
        assert!(matches!(err, QueryError::Configuration(_)));
    }

    #[tokio::test]
    async fn degraded_probe_does_not_fail() {
        match degraded().probe_health().await {
            ProbeOutcome::Unreachable(msg) => assert!(msg.contains("credentials unavailable")),
            ProbeOutcome::Reachable => unreachable!(),
        }
    }

    mod against_api_server {
        use axum::extract::Path;
        use axum::http::StatusCode;
        use axum::response::{IntoResponse, Response};
        use axum::routing::get;
        use axum::{Json, Router};
        use serde_json::json;

        use super::*;

        fn status(code: StatusCode, reason: &str, message: String) -> Response {
            let body = json!({
                "apiVersion": "v1",
                "kind": "Status",
                "metadata": {},
                "status": "Failure",
                "message": message,
                "reason": reason,
                "code": code.as_u16(),
            });
            (code, Json(body)).into_response()
        }

        fn pod_list(items: Vec<serde_json::Value>) -> Response {
            Json(json!({
                "apiVersion": "v1",
                "kind": "PodList",
                "metadata": {"resourceVersion": "1"},
                "items": items,
            }))
            .into_response()
        }

        // Namespaces: "empty" exists, "secret" exists but may not be read,
        // "busy" holds one pod, "gone" 404s on list, "slow" never answers in
        // time, anything else does not exist.
        async fn list_pods(Path(ns): Path<String>) -> Response {
            match ns.as_str() {
                "gone" => status(
                    StatusCode::NOT_FOUND,
                    "NotFound",
                    format!("namespaces \"{ns}\" not found"),
                ),
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    pod_list(vec![])
                }
                "busy" => pod_list(vec![json!({
                    "apiVersion": "v1",
                    "kind": "Pod",
                    "metadata": {"name": "web-0", "namespace": "busy"},
                })]),
                _ => pod_list(vec![]),
            }
        }

        async fn get_namespace(Path(ns): Path<String>) -> Response {
            match ns.as_str() {
                "empty" => Json(json!({
                    "apiVersion": "v1",
                    "kind": "Namespace",
                    "metadata": {"name": "empty"},
                }))
                .into_response(),
                "secret" => status(
                    StatusCode::FORBIDDEN,
                    "Forbidden",
                    format!("namespaces \"{ns}\" is forbidden"),
                ),
                _ => status(
                    StatusCode::NOT_FOUND,
                    "NotFound",
                    format!("namespaces \"{ns}\" not found"),
                ),
            }
        }

        async fn client() -> KubeClient {
            let app = Router::new()
                .route("/api/v1/namespaces/{ns}/pods", get(list_pods))
                .route("/api/v1/namespaces/{ns}", get(get_namespace));
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            let url: axum::http::Uri = format!("http://{addr}").parse().unwrap();
            let client = Client::try_from(Config::new(url)).unwrap();
            KubeClient {
                client: Ok(client),
                timeout: Duration::from_millis(500),
            }
        }

        #[tokio::test]
        async fn existing_empty_namespace_is_an_empty_listing() {
            let pods = client().await.list_pods("empty").await.unwrap();
            assert!(pods.is_empty());
        }

        #[tokio::test]
        async fn empty_listing_of_missing_namespace_is_not_found() {
            let err = client().await.list_pods("ghost").await.unwrap_err();
            assert_eq!(
                err,
                QueryError::NotFound {
                    namespace: "ghost".into()
                }
            );
        }

        #[tokio::test]
        async fn upstream_404_is_not_found() {
            let err = client().await.list_pods("gone").await.unwrap_err();
            assert_eq!(
                err,
                QueryError::NotFound {
                    namespace: "gone".into()
                }
            );
        }

        #[tokio::test]
        async fn populated_namespace_skips_existence_check() {
            let pods = client().await.list_pods("busy").await.unwrap();
            assert_eq!(pods.len(), 1);
            assert_eq!(pods[0].metadata.name.as_deref(), Some("web-0"));
        }

        #[tokio::test]
        async fn unreadable_namespace_object_counts_as_present() {
            let pods = client().await.list_pods("secret").await.unwrap();
            assert!(pods.is_empty());
        }

        #[tokio::test]
        async fn slow_listing_times_out_as_upstream() {
            match client().await.list_pods("slow").await.unwrap_err() {
                QueryError::Upstream { message, namespace } => {
                    assert!(message.contains("timed out"));
                    assert_eq!(namespace.as_deref(), Some("slow"));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }
}
