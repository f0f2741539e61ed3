//! Client failures and the deferred errors recorded during an export.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned across the cloud API boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Resource '{0}' not found")]
    NotFound(String),

    #[error("Request throttled by the service")]
    Throttled,

    #[error("Service error {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Operation '{0}' is not supported by this client")]
    Unsupported(String),
}

impl ClientError {
    /// Throttling, 5xx and transport failures may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Throttled | ClientError::Transport(_) => true,
            ClientError::Service { status, .. } => *status == 429 || *status >= 500,
            ClientError::NotFound(_)
            | ClientError::MalformedResponse(_)
            | ClientError::Unsupported(_) => false,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        ClientError::MalformedResponse(error.to_string())
    }
}

/// Failures captured while walking a graph edge or importing a resource.
/// These never abort a run; they are recorded and reported at the end.
#[derive(Error, Debug, Clone)]
pub enum DiscoveryError {
    #[error("API call failed: {0}")]
    Api(#[from] ClientError),

    #[error("Processing of discovered resources failed: {0}")]
    Processing(String),

    #[error("Resource '{0}' was listed but could not be found on refresh")]
    RefreshVoided(String),

    #[error("Import of '{address}' failed: {message}")]
    Import { address: String, message: String },

    #[error("terraform init failed: {0}")]
    Init(String),
}

/// A deferred error with enough context to report it after the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryErrorRecord {
    pub resource_class: String,
    pub parent_name: String,
    pub graph: String,
    pub message: String,
}

impl DiscoveryErrorRecord {
    pub fn new(resource_class: &str, parent_name: &str, graph: &str, error: &DiscoveryError) -> Self {
        Self {
            resource_class: resource_class.to_string(),
            parent_name: parent_name.to_string(),
            graph: graph.to_string(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for DiscoveryErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} under '{}': {}",
            self.graph, self.resource_class, self.parent_name, self.message
        )
    }
}
