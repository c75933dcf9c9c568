//! Domain errors for the planner janitor.

use thiserror::Error;

/// Domain-level errors surfaced by the ports and services.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Concurrency conflict: {entity} {id} was modified")]
    ConcurrencyConflict { entity: String, id: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No group available to create plan '{0}'")]
    NoGroupAvailable(String),

    #[error("No user found for email {0}")]
    UserNotFound(String),

    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Whether the failure came from the identity layer and should end the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::UserNotFound(_))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
