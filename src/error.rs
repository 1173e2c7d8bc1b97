//! # Error Types
//!
//! Local faults surfaced to callers. Transport failures during polling are
//! recovered inside the poll loop and never appear here; see
//! [`crate::client::TransportError`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryHumanError>;

#[derive(Debug, Error)]
pub enum QueryHumanError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Query {query_id} was cancelled before an outcome arrived")]
    Cancelled { query_id: String },

    #[error("Node '{node}' failed: {source}")]
    NodeOperation {
        node: String,
        #[source]
        source: Box<QueryHumanError>,
    },
}

impl QueryHumanError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Wrap a cause as a node-level operation failure for the host engine.
    pub fn node_operation(node: impl Into<String>, source: QueryHumanError) -> Self {
        Self::NodeOperation {
            node: node.into(),
            source: Box::new(source),
        }
    }

    /// Innermost cause, unwrapping any node-level wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &QueryHumanError {
        match self {
            Self::NodeOperation { source, .. } => source.root_cause(),
            other => other,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), Self::Cancelled { .. })
    }
}
