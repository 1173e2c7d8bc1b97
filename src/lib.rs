#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Query Human
//!
//! Human-in-the-loop step for workflow automation: pause a pipeline, ask a
//! person a question through a remote human-query service, and resume once
//! an answer arrives or the timeout passes.
//!
//! ## Overview
//!
//! The service is an opaque HTTP endpoint (`POST {base_url}queryHuman`).
//! Pending questions live there; this crate only re-asks. Each `ask` call:
//!
//! 1. derives one correlation ID from the API key and submission time,
//! 2. posts the identical payload until any HTTP response arrives,
//! 3. swallows transport failures and retries after a fixed 1s backoff,
//! 4. gives up with the `"Timeout occurred"` marker once the budget passes.
//!
//! ## Module Organization
//!
//! - [`client`] - `HumanQueryClient`, the poll state machine, HTTP transport
//! - [`node`] - host-facing workflow node and its parameter schema
//! - [`query`] - `QueryRequest`, `QueryId`, wire payload
//! - [`outcome`] - `QueryOutcome`
//! - [`config`] - layered configuration (defaults, TOML, env)
//! - [`error`] - structured error handling
//! - [`logging`] - tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use query_human::{HumanQueryClient, QueryHumanConfig, QueryOutcome};
//!
//! # async fn example() -> query_human::Result<()> {
//! let config = QueryHumanConfig::load()?;
//! let client = HumanQueryClient::new(&config)?;
//!
//! let outcome = client
//!     .query_human("api-key", "agent-1", "Deploy Bot", "Proceed?", None, Some(600))
//!     .await?;
//!
//! match outcome {
//!     QueryOutcome::Answered { body } => println!("human said: {body}"),
//!     QueryOutcome::Rejected { status, body } => eprintln!("service refused ({status}): {body}"),
//!     QueryOutcome::TimedOut => eprintln!("nobody answered"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod node;
pub mod outcome;
pub mod query;

pub use client::{AbortHandle, AbortSignal, HumanQueryClient};
pub use config::{
    AttemptTimeoutPolicy, NodeConfig, OutcomeDelivery, PollingConfig, QueryHumanConfig,
    QueryIdStrategy, ServiceConfig,
};
pub use constants::TIMEOUT_MARKER;
pub use error::{QueryHumanError, Result};
pub use node::{NodeExecutionContext, NodeItem, NodeParameters, QueryHumanNode, WorkflowNode};
pub use outcome::QueryOutcome;
pub use query::{QueryId, QueryRequest};
