//! # Constants
//!
//! Wire-level and policy constants shared by the client, the node and the
//! configuration defaults.

use std::time::Duration;

/// Base URL of the hosted human-query service. Always ends with `/`.
pub const DEFAULT_BASE_URL: &str = "https://cerebrus-prod-eastus.azurewebsites.net/";

/// Path segment appended to the base URL for query submission.
pub const QUERY_HUMAN_PATH: &str = "queryHuman";

/// Overall wait budget when neither the caller nor the config supplies one (24 hours).
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 86_400;

/// Fixed delay between unsuccessful attempts.
pub const DEFAULT_BACKOFF_MS: u64 = 1_000;

/// Literal returned to callers when the overall deadline passes.
pub const TIMEOUT_MARKER: &str = "Timeout occurred";

/// Item field used when outcomes are attached to output items.
pub const DEFAULT_RESPONSE_FIELD: &str = "response";

/// Default backoff as a [`Duration`].
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(DEFAULT_BACKOFF_MS);

/// Node identity as registered with the host engine.
pub mod node {
    pub const NAME: &str = "queryHuman";
    pub const DISPLAY_NAME: &str = "Query Human";
    pub const DESCRIPTION: &str = "Basic Node for Querying Humans";
    pub const GROUP: &str = "transform";
    pub const VERSION: u32 = 1;
    pub const MAIN_CONNECTION: &str = "main";
}

/// Parameter names exposed by the node.
pub mod parameters {
    pub const QUERY_TEXT: &str = "queryText";
    pub const METADATA: &str = "metadata";
    pub const TIMEOUT: &str = "timeout";
    pub const API_KEY: &str = "apiKey";
    pub const AGENT_ID: &str = "agentID";
    pub const AGENT_NAME: &str = "agentName";
}

/// Environment variables read by [`crate::config::QueryHumanConfig`].
pub mod env {
    pub const BASE_URL: &str = "QUERY_HUMAN_BASE_URL";
    pub const TIMEOUT_SECONDS: &str = "QUERY_HUMAN_TIMEOUT_SECONDS";
    pub const BACKOFF_MS: &str = "QUERY_HUMAN_BACKOFF_MS";
    pub const ATTEMPT_TIMEOUT: &str = "QUERY_HUMAN_ATTEMPT_TIMEOUT";
    pub const QUERY_ID_STRATEGY: &str = "QUERY_HUMAN_QUERY_ID_STRATEGY";
    pub const OUTCOME_DELIVERY: &str = "QUERY_HUMAN_OUTCOME_DELIVERY";
    pub const ENVIRONMENT: &str = "QUERY_HUMAN_ENV";
    pub const LOG_FORMAT: &str = "QUERY_HUMAN_LOG_FORMAT";
    pub const API_KEY: &str = "QUERY_HUMAN_API_KEY";
}
