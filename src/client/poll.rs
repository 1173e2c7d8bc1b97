//! # Poll State Machine
//!
//! The retry loop expressed as explicit states:
//!
//! ```text
//! Polling{n} --response (any status)--> Terminal(outcome)
//! Polling{n} --transport failure, elapsed <= budget--> Polling{n+1}
//! Polling{n} --transport failure, elapsed >  budget--> Expired
//! ```
//!
//! Transitions are pure; [`super::HumanQueryClient`] drives them, sleeping
//! the backoff between `Polling` states and watching for cancellation.

use std::fmt;
use std::time::Duration;

use super::transport::{TransportError, TransportResponse};
use crate::config::AttemptTimeoutPolicy;
use crate::outcome::QueryOutcome;

/// Result of one submission attempt.
#[derive(Debug)]
pub enum AttemptResult {
    Responded(TransportResponse),
    Failed(TransportError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// Waiting on attempt number `attempt` (1-based)
    Polling { attempt: u32 },
    /// The service responded
    Terminal(QueryOutcome),
    /// The overall budget ran out without a response
    Expired,
}

impl PollState {
    pub fn start() -> Self {
        Self::Polling { attempt: 1 }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Polling { .. })
    }

    /// Next state after an attempt finished `elapsed` into a `budget`.
    /// Terminal states absorb further results.
    pub fn advance(self, result: AttemptResult, elapsed: Duration, budget: Duration) -> Self {
        let Self::Polling { attempt } = self else {
            return self;
        };

        match result {
            AttemptResult::Responded(response) => {
                Self::Terminal(QueryOutcome::from_response(response.status, response.body))
            }
            AttemptResult::Failed(_) if elapsed > budget => Self::Expired,
            AttemptResult::Failed(_) => Self::Polling {
                attempt: attempt.saturating_add(1),
            },
        }
    }

    /// Outcome of a terminal state; `None` while still polling.
    pub fn into_outcome(self) -> Option<QueryOutcome> {
        match self {
            Self::Polling { .. } => None,
            Self::Terminal(outcome) => Some(outcome),
            Self::Expired => Some(QueryOutcome::TimedOut),
        }
    }
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polling { attempt } => write!(f, "polling (attempt {attempt})"),
            Self::Terminal(outcome) => write!(f, "terminal ({})", outcome.kind()),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Time allowed for the next attempt under `policy`.
pub fn attempt_timeout(policy: AttemptTimeoutPolicy, budget: Duration, elapsed: Duration) -> Duration {
    match policy {
        AttemptTimeoutPolicy::FullBudget => budget,
        AttemptTimeoutPolicy::RemainingBudget => budget.saturating_sub(elapsed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BUDGET: Duration = Duration::from_secs(10);

    fn failed() -> AttemptResult {
        AttemptResult::Failed(TransportError::Connect("refused".to_string()))
    }

    fn responded(status: u16) -> AttemptResult {
        AttemptResult::Responded(TransportResponse {
            status,
            body: json!({"status": status}),
        })
    }

    #[test]
    fn test_response_is_terminal_for_any_status() {
        for status in [200, 400, 500] {
            let state = PollState::start().advance(responded(status), Duration::ZERO, BUDGET);
            assert!(state.is_terminal());
            assert_eq!(
                state.into_outcome().and_then(|o| o.status()),
                Some(status)
            );
        }
    }

    #[test]
    fn test_response_after_deadline_still_wins() {
        let state = PollState::start().advance(responded(200), Duration::from_secs(60), BUDGET);
        assert!(matches!(state, PollState::Terminal(QueryOutcome::Answered { .. })));
    }

    #[test]
    fn test_failure_keeps_polling_until_strictly_past_budget() {
        let state = PollState::start().advance(failed(), BUDGET, BUDGET);
        assert_eq!(state, PollState::Polling { attempt: 2 });

        let state = state.advance(failed(), BUDGET + Duration::from_millis(1), BUDGET);
        assert_eq!(state, PollState::Expired);
        assert_eq!(state.into_outcome(), Some(QueryOutcome::TimedOut));
    }

    #[test]
    fn test_driving_from_start_reaches_a_single_outcome() {
        let mut state = PollState::start();
        let mut elapsed = Duration::ZERO;
        while !state.is_terminal() {
            state = state.advance(failed(), elapsed, BUDGET);
            elapsed += Duration::from_secs(1);
        }

        // failures at t = 0..=10 keep polling, t = 11 expires
        assert_eq!(elapsed, Duration::from_secs(12));
        assert_eq!(state.into_outcome(), Some(QueryOutcome::TimedOut));
    }

    #[test]
    fn test_terminal_states_absorb_results() {
        let expired = PollState::Expired.advance(responded(200), Duration::ZERO, BUDGET);
        assert_eq!(expired, PollState::Expired);
        assert_eq!(PollState::start().into_outcome(), None);
        assert_eq!(PollState::start().to_string(), "polling (attempt 1)");
    }

    #[test]
    fn test_attempt_timeout_policies() {
        let elapsed = Duration::from_secs(4);
        assert_eq!(
            attempt_timeout(AttemptTimeoutPolicy::FullBudget, BUDGET, elapsed),
            BUDGET
        );
        assert_eq!(
            attempt_timeout(AttemptTimeoutPolicy::RemainingBudget, BUDGET, elapsed),
            Duration::from_secs(6)
        );
        assert_eq!(
            attempt_timeout(AttemptTimeoutPolicy::RemainingBudget, BUDGET, BUDGET * 2),
            Duration::ZERO
        );
    }
}
