//! # Workflow Node
//!
//! Host-facing surface. A host engine registers [`QueryHumanNode`] using its
//! [`NodeDescription`], then calls `execute` with resolved parameters and the
//! incoming items.
//!
//! ```rust,no_run
//! use query_human::node::{NodeExecutionContext, NodeItem, NodeParameters, QueryHumanNode, WorkflowNode};
//! use query_human::QueryHumanConfig;
//!
//! # async fn example() -> query_human::Result<()> {
//! let node = QueryHumanNode::new(&QueryHumanConfig::load()?)?;
//! let parameters = NodeParameters::new()
//!     .with("apiKey", "key")
//!     .with("agentID", "agent-1")
//!     .with("agentName", "Deploy Bot")
//!     .with("queryText", "Proceed with the rollout?")
//!     .with("timeout", 600);
//!
//! let context = NodeExecutionContext::new("Query Human", parameters, vec![NodeItem::default()]);
//! let items = node.execute(&context).await?;
//! # Ok(())
//! # }
//! ```

pub mod description;
pub mod parameters;
pub mod query_human_node;
pub mod traits;

pub use description::{NodeDefaults, NodeDescription, NodeProperty, PropertyType};
pub use parameters::NodeParameters;
pub use query_human_node::QueryHumanNode;
pub use traits::{NodeExecutionContext, NodeItem, WorkflowNode};
