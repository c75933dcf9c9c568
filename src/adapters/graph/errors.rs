use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::infrastructure::logging::scrub;

/// Errors from acquiring an access token.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Token or device-code endpoint answered with an unexpected status
    #[error("Token endpoint returned {status}: {body}")]
    Endpoint { status: StatusCode, body: String },

    /// The identity platform refused the grant
    #[error("Authorization denied ({code}): {description}")]
    Denied { code: String, description: String },

    /// The user did not finish device sign-in in time
    #[error("Device code expired before sign-in completed")]
    DeviceCodeExpired,

    #[error("Client secret is required for app authentication")]
    MissingClientSecret,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// Build an endpoint error with the body scrubbed of credentials.
    pub fn endpoint(status: StatusCode, body: &str) -> Self {
        Self::Endpoint {
            status,
            body: scrub(body),
        }
    }
}

/// Errors from a Graph request.
#[derive(Error, Debug)]
pub enum GraphError {
    /// HTTP 401
    #[error("Unauthorized on {path}: {body}")]
    Unauthorized { path: String, body: String },

    /// HTTP 403
    #[error("Forbidden on {path}: {body}")]
    Forbidden { path: String, body: String },

    /// HTTP 404
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// HTTP 409 or 412: the `If-Match` token is stale
    #[error("Precondition failed on {path}")]
    PreconditionFailed { path: String },

    /// Any other non-success status
    #[error("Graph returned {status} for {path}: {body}")]
    Status {
        status: StatusCode,
        path: String,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response from {path}: {reason}")]
    InvalidResponse { path: String, reason: String },

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl GraphError {
    /// Classify a non-success response. The body is scrubbed first.
    pub fn from_status(status: StatusCode, path: &str, body: &str) -> Self {
        let path = path.to_string();
        let body = scrub(body);
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized { path, body },
            StatusCode::FORBIDDEN => Self::Forbidden { path, body },
            StatusCode::NOT_FOUND => Self::NotFound { path },
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                Self::PreconditionFailed { path }
            }
            status => Self::Status { status, path, body },
        }
    }

    /// Map to a domain error, naming the entity a stale token belonged to.
    pub fn into_domain(self, entity: &str, id: &str) -> DomainError {
        match self {
            Self::PreconditionFailed { .. } => DomainError::ConcurrencyConflict {
                entity: entity.to_string(),
                id: id.to_string(),
            },
            other => other.into(),
        }
    }
}

impl From<GraphError> for DomainError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Unauthorized { .. } | GraphError::Forbidden { .. } => {
                DomainError::Authentication(err.to_string())
            }
            GraphError::Auth(auth) => auth.into(),
            GraphError::NotFound { path } => DomainError::NotFound(path),
            GraphError::PreconditionFailed { path } => DomainError::ConcurrencyConflict {
                entity: "resource".to_string(),
                id: path,
            },
            GraphError::InvalidResponse { .. } => DomainError::SerializationError(err.to_string()),
            GraphError::Status { .. } | GraphError::Network(_) => {
                DomainError::Transport(scrub(&err.to_string()))
            }
        }
    }
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        DomainError::Authentication(scrub(&err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            GraphError::from_status(StatusCode::UNAUTHORIZED, "groups", ""),
            GraphError::Unauthorized { .. }
        ));
        assert!(matches!(
            GraphError::from_status(StatusCode::FORBIDDEN, "groups", ""),
            GraphError::Forbidden { .. }
        ));
        assert!(matches!(
            GraphError::from_status(StatusCode::NOT_FOUND, "groups/x", ""),
            GraphError::NotFound { .. }
        ));
        assert!(matches!(
            GraphError::from_status(StatusCode::CONFLICT, "planner/tasks/t", ""),
            GraphError::PreconditionFailed { .. }
        ));
        assert!(matches!(
            GraphError::from_status(StatusCode::PRECONDITION_FAILED, "planner/tasks/t", ""),
            GraphError::PreconditionFailed { .. }
        ));
        assert!(matches!(
            GraphError::from_status(StatusCode::BAD_GATEWAY, "groups", "upstream"),
            GraphError::Status { .. }
        ));
    }

    #[test]
    fn test_domain_mapping() {
        let err = GraphError::from_status(StatusCode::PRECONDITION_FAILED, "planner/tasks/t1", "");
        assert!(matches!(
            err.into_domain("task", "t1"),
            DomainError::ConcurrencyConflict { entity, id } if entity == "task" && id == "t1"
        ));

        let err: DomainError = GraphError::from_status(StatusCode::FORBIDDEN, "groups", "").into();
        assert!(matches!(err, DomainError::Authentication(_)));

        let err: DomainError =
            GraphError::from_status(StatusCode::SERVICE_UNAVAILABLE, "groups", "busy").into();
        assert!(matches!(err, DomainError::Transport(msg) if msg.contains("503")));
    }

    #[test]
    fn test_bodies_are_scrubbed() {
        let err = GraphError::from_status(
            StatusCode::BAD_REQUEST,
            "groups",
            r#"{"error":"bad","access_token":"leaked"}"#,
        );
        assert!(!err.to_string().contains("leaked"));

        let auth = AuthError::endpoint(StatusCode::BAD_REQUEST, "client_secret=oops");
        assert!(!auth.to_string().contains("oops"));
    }
}
