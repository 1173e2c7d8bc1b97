//! # Query Model
//!
//! The request a caller builds, the correlation ID derived from it, and the
//! JSON payload that goes over the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::config::QueryIdStrategy;
use crate::constants::DEFAULT_TIMEOUT_SECONDS;
use crate::error::{QueryHumanError, Result};

/// A question for a human. Immutable once built.
///
/// ```rust
/// use query_human::QueryRequest;
///
/// let request = QueryRequest::builder("k", "a1", "Agent", "Proceed?")
///     .timeout_seconds(10)
///     .build()
///     .unwrap();
/// assert_eq!(request.metadata(), "");
/// assert_eq!(request.timeout().as_secs(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    api_key: String,
    agent_id: String,
    agent_name: String,
    query_text: String,
    metadata: String,
    timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct QueryRequestBuilder {
    api_key: String,
    agent_id: String,
    agent_name: String,
    query_text: String,
    metadata: String,
    timeout_seconds: i64,
}

impl QueryRequest {
    pub fn builder(
        api_key: impl Into<String>,
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        query_text: impl Into<String>,
    ) -> QueryRequestBuilder {
        QueryRequestBuilder {
            api_key: api_key.into(),
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            query_text: query_text.into(),
            metadata: String::new(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS as i64,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    /// Overall wait budget for this query.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Wire payload carrying the given correlation ID.
    pub fn payload<'a>(&'a self, query_id: &'a QueryId) -> QueryPayload<'a> {
        QueryPayload {
            api_key: &self.api_key,
            query: &self.query_text,
            query_id: query_id.as_str(),
            agent_id: &self.agent_id,
            agent_name: &self.agent_name,
            metadata: &self.metadata,
        }
    }
}

impl QueryRequestBuilder {
    pub fn metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Signed so that host-supplied values can be validated rather than
    /// silently wrapped.
    pub fn timeout_seconds(mut self, timeout_seconds: i64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn build(self) -> Result<QueryRequest> {
        let timeout_seconds = u64::try_from(self.timeout_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                QueryHumanError::invalid_input(format!(
                    "timeout must be a positive number of seconds, got {}",
                    self.timeout_seconds
                ))
            })?;

        Ok(QueryRequest {
            api_key: self.api_key,
            agent_id: self.agent_id,
            agent_name: self.agent_name,
            query_text: self.query_text,
            metadata: self.metadata,
            timeout_seconds,
        })
    }
}

/// Correlation key the remote service uses to match retries of one query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryId(String);

impl QueryId {
    /// Derive an ID from the API key and the submission time.
    ///
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use query_human::config::QueryIdStrategy;
    /// use query_human::QueryId;
    ///
    /// let at = Utc.timestamp_millis_opt(1_700_000_000_250).unwrap();
    /// let id = QueryId::derive("k1", at, QueryIdStrategy::Timestamp);
    /// assert_eq!(id.as_str(), "k1-1700000000.25");
    /// ```
    pub fn derive(api_key: &str, submitted_at: DateTime<Utc>, strategy: QueryIdStrategy) -> Self {
        let seconds = unix_seconds_with_fraction(submitted_at);
        match strategy {
            QueryIdStrategy::Timestamp => Self(format!("{api_key}-{seconds}")),
            QueryIdStrategy::TimestampWithNonce => {
                Self(format!("{api_key}-{seconds}-{}", Uuid::new_v4().simple()))
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix seconds with millisecond fraction, trailing zeros trimmed
/// (`1700000000.5`, `1700000000`).
fn unix_seconds_with_fraction(at: DateTime<Utc>) -> String {
    let millis = at.timestamp_millis();
    let seconds = millis.div_euclid(1000);
    let fraction = millis.rem_euclid(1000);

    if fraction == 0 {
        seconds.to_string()
    } else {
        let digits = format!("{fraction:03}");
        format!("{seconds}.{}", digits.trim_end_matches('0'))
    }
}

/// JSON body of `POST queryHuman`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryPayload<'a> {
    #[serde(rename = "apiKey")]
    pub api_key: &'a str,
    pub query: &'a str,
    #[serde(rename = "queryID")]
    pub query_id: &'a str,
    #[serde(rename = "agentID")]
    pub agent_id: &'a str,
    #[serde(rename = "agentName")]
    pub agent_name: &'a str,
    pub metadata: &'a str,
}
