//! # Query Outcomes
//!
//! Terminal results of a query. Pending state lives in the remote service;
//! nothing here represents "not answered yet".

use serde_json::Value;
use std::fmt;

use crate::constants::TIMEOUT_MARKER;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The service answered with status 200. Body is verbatim.
    Answered { body: Value },
    /// The service answered with any other status. Body is verbatim and the
    /// caller must inspect it (it usually carries an `error` field).
    Rejected { status: u16, body: Value },
    /// The overall deadline passed without any HTTP response.
    TimedOut,
}

impl QueryOutcome {
    /// Classify a terminal HTTP response.
    pub fn from_response(status: u16, body: Value) -> Self {
        if status == 200 {
            Self::Answered { body }
        } else {
            Self::Rejected { status, body }
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered { .. })
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }

    /// HTTP status, if the service responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Answered { .. } => Some(200),
            Self::Rejected { status, .. } => Some(*status),
            Self::TimedOut => None,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Answered { body } | Self::Rejected { body, .. } => Some(body),
            Self::TimedOut => None,
        }
    }

    /// The value a caller sees: the response body, or the string
    /// `"Timeout occurred"`.
    pub fn into_value(self) -> Value {
        match self {
            Self::Answered { body } | Self::Rejected { body, .. } => body,
            Self::TimedOut => Value::String(TIMEOUT_MARKER.to_string()),
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Answered { .. } => "answered",
            Self::Rejected { .. } => "rejected",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Answered { body } => write!(f, "Success: {body}"),
            Self::Rejected { status, body } => write!(f, "Error ({status}): {body}"),
            Self::TimedOut => f.write_str(TIMEOUT_MARKER),
        }
    }
}
