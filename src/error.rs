use serde::{Deserialize, Serialize};

/// Failure classes shared by every query path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// No usable cluster credentials were found at startup.
    #[error("cluster credentials unavailable: {0}")]
    Configuration(String),
    #[error("namespace '{namespace}' not found")]
    NotFound { namespace: String },
    #[error("invalid namespace name {0:?}")]
    InvalidNamespace(String),
    /// Transport, auth or unexpected API failure. `message` is the
    /// underlying error text, unchanged.
    #[error("{}", upstream_message(.message, .namespace))]
    Upstream {
        message: String,
        namespace: Option<String>,
    },
}

fn upstream_message(message: &str, namespace: &Option<String>) -> String {
    match namespace {
        Some(ns) => format!("API error in namespace '{ns}': {message}"),
        None => format!("API error: {message}"),
    }
}

impl QueryError {
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            namespace: None,
        }
    }

    /// Stable machine-readable code used in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidNamespace(_) => "BAD_REQUEST",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
        }
    }

    /// Attaches `namespace` to an upstream failure that lacks one.
    pub fn in_namespace(self, ns: &str) -> Self {
        match self {
            Self::Upstream {
                message,
                namespace: None,
            } => Self::Upstream {
                message,
                namespace: Some(ns.to_string()),
            },
            other => other,
        }
    }
}

/// JSON body returned by the HTTP API for any failed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Underlying message of an upstream or configuration failure, without
    /// the class prefix `error` carries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&QueryError> for ErrorBody {
    fn from(err: &QueryError) -> Self {
        let (namespace, detail) = match err {
            QueryError::NotFound { namespace } => (Some(namespace.clone()), None),
            QueryError::InvalidNamespace(namespace) => (Some(namespace.clone()), None),
            QueryError::Upstream { message, namespace } => (namespace.clone(), Some(message.clone())),
            QueryError::Configuration(message) => (None, Some(message.clone())),
        };
        Self {
            error: err.to_string(),
            code: err.code().to_string(),
            namespace,
            detail,
        }
    }
}

impl ErrorBody {
    /// Rebuilds the error class from a body produced by another instance.
    pub fn into_query_error(self) -> QueryError {
        let ErrorBody {
            error,
            code,
            namespace,
            detail,
        } = self;
        match (code.as_str(), namespace) {
            ("NOT_FOUND", Some(namespace)) => QueryError::NotFound { namespace },
            ("BAD_REQUEST", Some(namespace)) => QueryError::InvalidNamespace(namespace),
            ("CONFIGURATION_ERROR", _) => QueryError::Configuration(detail.unwrap_or(error)),
            (_, namespace) => QueryError::Upstream {
                message: detail.unwrap_or(error),
                namespace,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_is_verbatim() {
        let err = QueryError::upstream("connection refused");
        assert_eq!(err.to_string(), "API error: connection refused");

        let err = err.in_namespace("default");
        assert_eq!(
            err.to_string(),
            "API error in namespace 'default': connection refused"
        );
    }

    #[test]
    fn in_namespace_keeps_other_variants() {
        let err = QueryError::NotFound {
            namespace: "ghost".into(),
        }
        .in_namespace("other");
        assert_eq!(
            err,
            QueryError::NotFound {
                namespace: "ghost".into()
            }
        );
        assert_eq!(err.to_string(), "namespace 'ghost' not found");
    }

    #[test]
    fn error_body_keeps_not_found_class() {
        let err = QueryError::NotFound {
            namespace: "ghost".into(),
        };
        let body = ErrorBody::from(&err);
        assert_eq!(body.code, "NOT_FOUND");
        assert_eq!(body.namespace.as_deref(), Some("ghost"));
        assert_eq!(body.into_query_error(), err);
    }

    #[test]
    fn error_body_keeps_upstream_message_and_namespace() {
        let err = QueryError::upstream("forbidden").in_namespace("default");
        let body = ErrorBody::from(&err);
        assert_eq!(body.error, "API error in namespace 'default': forbidden");
        assert_eq!(body.detail.as_deref(), Some("forbidden"));

        let wire = serde_json::to_string(&body).unwrap();
        let back: ErrorBody = serde_json::from_str(&wire).unwrap();
        let rebuilt = back.into_query_error();
        assert_eq!(rebuilt, err);
        assert_eq!(rebuilt.to_string(), "API error in namespace 'default': forbidden");
    }

    #[test]
    fn error_body_keeps_configuration_message() {
        let err = QueryError::Configuration("loading kubeconfig: no such file".into());
        assert_eq!(ErrorBody::from(&err).into_query_error(), err);
    }

    #[test]
    fn body_without_detail_is_upstream() {
        let body = ErrorBody {
            error: "gateway exploded".into(),
            code: "SOMETHING_ELSE".into(),
            namespace: None,
            detail: None,
        };
        assert_eq!(body.into_query_error(), QueryError::upstream("gateway exploded"));
    }
}
