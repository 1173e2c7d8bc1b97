//! # Human Query Client
//!
//! Everything between "here is a question" and "here is the outcome":
//!
//! - **HumanQueryClient**: `ask` / `ask_with_abort`, the poll loop driver
//! - **PollState**: explicit `{Polling, Terminal, Expired}` state machine
//! - **QueryTransport**: one submission attempt; `HttpTransport` over `reqwest`
//! - **AbortHandle / AbortSignal**: cooperative cancellation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use query_human::client::{AbortHandle, HumanQueryClient};
//! use query_human::QueryHumanConfig;
//!
//! # async fn example() -> query_human::Result<()> {
//! let client = HumanQueryClient::new(&QueryHumanConfig::default())?;
//! let request = client.request("key", "agent-1", "Agent", "Ship it?").build()?;
//!
//! let (handle, signal) = AbortHandle::new();
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     handle.abort();
//! });
//!
//! let outcome = client.ask_with_abort(&request, &signal).await?;
//! # Ok(())
//! # }
//! ```

pub mod abort;
pub mod human_query_client;
pub mod poll;
pub mod transport;

pub use abort::{AbortHandle, AbortSignal};
pub use human_query_client::HumanQueryClient;
pub use poll::{AttemptResult, PollState};
pub use transport::{HttpTransport, QueryTransport, TransportError, TransportResponse};
