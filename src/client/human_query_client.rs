//! # Human Query Client
//!
//! Submits a query and keeps re-submitting the identical payload until the
//! service responds or the overall budget runs out.

use chrono::Utc;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::abort::AbortSignal;
use super::poll::{self, AttemptResult, PollState};
use super::transport::{HttpTransport, QueryTransport};
use crate::config::{PollingConfig, QueryHumanConfig};
use crate::error::{QueryHumanError, Result};
use crate::outcome::QueryOutcome;
use crate::query::{QueryId, QueryRequest, QueryRequestBuilder};

/// Client for the remote human-query service.
///
/// Cheap to clone; clones share the underlying connection pool. Concurrent
/// `ask` calls are independent of each other.
///
/// ```rust,no_run
/// use query_human::{HumanQueryClient, QueryHumanConfig};
///
/// # async fn example() -> query_human::Result<()> {
/// let client = HumanQueryClient::new(&QueryHumanConfig::default())?;
/// let request = client
///     .request("api-key", "agent-1", "Deploy Bot", "Proceed with the rollout?")
///     .timeout_seconds(600)
///     .build()?;
///
/// let outcome = client.ask(&request).await?;
/// println!("{}", outcome.into_value());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HumanQueryClient {
    transport: Arc<dyn QueryTransport>,
    polling: PollingConfig,
}

impl std::fmt::Debug for HumanQueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HumanQueryClient")
            .field("endpoint", &self.transport.endpoint())
            .field("polling", &self.polling)
            .finish()
    }
}

impl HumanQueryClient {
    /// Create a client posting over HTTP to the configured service.
    pub fn new(config: &QueryHumanConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.service)?;

        info!(
            endpoint = %transport.endpoint(),
            default_timeout_seconds = config.polling.default_timeout_seconds,
            backoff_ms = config.polling.backoff_ms,
            attempt_timeout = ?config.polling.attempt_timeout,
            "Created human query client"
        );

        Ok(Self::with_transport(Arc::new(transport), config.polling.clone()))
    }

    pub fn with_transport(transport: Arc<dyn QueryTransport>, polling: PollingConfig) -> Self {
        Self { transport, polling }
    }

    pub fn polling_config(&self) -> &PollingConfig {
        &self.polling
    }

    /// Request builder seeded with this client's default timeout.
    pub fn request(
        &self,
        api_key: impl Into<String>,
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        query_text: impl Into<String>,
    ) -> QueryRequestBuilder {
        QueryRequest::builder(api_key, agent_id, agent_name, query_text)
            .timeout_seconds(self.default_timeout_seconds())
    }

    fn default_timeout_seconds(&self) -> i64 {
        i64::try_from(self.polling.default_timeout_seconds).unwrap_or(i64::MAX)
    }

    /// Positional form of [`Self::ask`]. `None` takes the defaults: empty
    /// metadata and the configured timeout.
    pub async fn query_human(
        &self,
        api_key: &str,
        agent_id: &str,
        agent_name: &str,
        query_text: &str,
        metadata: Option<&str>,
        timeout_seconds: Option<i64>,
    ) -> Result<QueryOutcome> {
        let request = self
            .request(api_key, agent_id, agent_name, query_text)
            .metadata(metadata.unwrap_or_default())
            .timeout_seconds(timeout_seconds.unwrap_or_else(|| self.default_timeout_seconds()))
            .build()?;

        self.ask(&request).await
    }

    /// Ask and wait for an outcome.
    ///
    /// Returns `Ok` with either the service's response (any status) or
    /// [`QueryOutcome::TimedOut`]. Transport failures are retried, never
    /// returned.
    pub async fn ask(&self, request: &QueryRequest) -> Result<QueryOutcome> {
        self.ask_with_abort(request, &AbortSignal::never()).await
    }

    /// [`Self::ask`] that also stops with [`QueryHumanError::Cancelled`]
    /// once `abort` fires, whether mid-request or mid-backoff.
    #[instrument(skip_all, fields(agent_id = %request.agent_id(), agent_name = %request.agent_name()))]
    pub async fn ask_with_abort(
        &self,
        request: &QueryRequest,
        abort: &AbortSignal,
    ) -> Result<QueryOutcome> {
        let start = Instant::now();
        let query_id = QueryId::derive(request.api_key(), Utc::now(), self.polling.query_id_strategy);
        let payload = request.payload(&query_id);
        let budget = request.timeout();
        let backoff = self.polling.backoff();

        info!(
            query_id = %query_id,
            endpoint = %self.transport.endpoint(),
            timeout_seconds = request.timeout_seconds(),
            "Submitting query to human"
        );

        let mut state = PollState::start();
        let mut attempts = 0;
        while let PollState::Polling { attempt } = state {
            attempts = attempt;
            let attempt_timeout =
                poll::attempt_timeout(self.polling.attempt_timeout, budget, start.elapsed());

            debug!(
                query_id = %query_id,
                attempt = attempt,
                attempt_timeout_ms = attempt_timeout.as_millis() as u64,
                "Sending query attempt"
            );

            let result = tokio::select! {
                biased;
                _ = abort.aborted() => return Err(cancelled(&query_id, attempt)),
                result = self.transport.submit(&payload, attempt_timeout) => match result {
                    Ok(response) => AttemptResult::Responded(response),
                    Err(error) => {
                        warn!(
                            query_id = %query_id,
                            attempt = attempt,
                            error = %error,
                            "Request failed, no answer yet"
                        );
                        AttemptResult::Failed(error)
                    }
                },
            };

            state = state.advance(result, start.elapsed(), budget);
            if state.is_terminal() {
                break;
            }

            tokio::select! {
                biased;
                _ = abort.aborted() => return Err(cancelled(&query_id, attempt)),
                _ = tokio::time::sleep(backoff) => {}
            }
        }

        // the loop only exits on a terminal state
        let outcome = state.into_outcome().unwrap_or(QueryOutcome::TimedOut);

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            QueryOutcome::TimedOut => warn!(
                query_id = %query_id,
                attempts = attempts,
                elapsed_ms = elapsed_ms,
                "Timeout occurred"
            ),
            other => info!(
                query_id = %query_id,
                attempts = attempts,
                elapsed_ms = elapsed_ms,
                status = other.status(),
                outcome = other.kind(),
                "Query completed"
            ),
        }

        Ok(outcome)
    }
}

fn cancelled(query_id: &QueryId, attempt: u32) -> QueryHumanError {
    warn!(query_id = %query_id, attempt = attempt, "Query cancelled");
    QueryHumanError::Cancelled {
        query_id: query_id.to_string(),
    }
}
