use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    /// Instance type of the statically provisioned node group. Nodes of any
    /// other type are reported as likely autoscaled.
    #[serde(default = "default_baseline_instance_type")]
    pub baseline_instance_type: String,
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
    #[serde(default = "default_pod_status_namespaces")]
    pub pod_status_namespaces: Vec<String>,
    /// Base URL of a running `serve` instance, used by `bridge`.
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub require_credentials: bool,
}

fn default_cluster_name() -> String {
    "mcp-eks-cluster".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_listen_port() -> u16 {
    8080
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_baseline_instance_type() -> String {
    "t3.medium".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    10
}

fn default_pod_status_namespaces() -> Vec<String> {
    vec![
        "default".to_string(),
        "mcp-server".to_string(),
        "karpenter".to_string(),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cluster_name: default_cluster_name(),
            region: default_region(),
            listen_port: default_listen_port(),
            default_namespace: default_namespace(),
            baseline_instance_type: default_baseline_instance_type(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
            pod_status_namespaces: default_pod_status_namespaces(),
            api_base: None,
            require_credentials: false,
        }
    }
}

impl Config {
    /// Loads the optional YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(path) => {
                let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_yaml(&data)?
            }
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn from_yaml(data: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map.
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(data)?)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CLUSTER_NAME") {
            self.cluster_name = v;
        }
        if let Some(v) = lookup("AWS_REGION") {
            self.region = v;
        }
        if let Some(v) = lookup("PORT") {
            self.listen_port = parse_env("PORT", v)?;
        }
        if let Some(v) = lookup("DEFAULT_NAMESPACE") {
            self.default_namespace = v;
        }
        if let Some(v) = lookup("BASELINE_INSTANCE_TYPE") {
            self.baseline_instance_type = v;
        }
        if let Some(v) = lookup("UPSTREAM_TIMEOUT_SECS") {
            self.upstream_timeout_secs = parse_env("UPSTREAM_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = lookup("POD_STATUS_NAMESPACES") {
            self.pod_status_namespaces = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = lookup("MCP_API_BASE") {
            self.api_base = Some(v);
        }
        if let Some(v) = lookup("REQUIRE_CREDENTIALS") {
            self.require_credentials = parse_env("REQUIRE_CREDENTIALS", v)?;
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.listen_port)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}
