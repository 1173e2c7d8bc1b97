//! # Workflow Node Traits
//!
//! The seam between a host workflow engine and a node implementation. The
//! host builds a [`NodeExecutionContext`] per execution and gets back output
//! items or an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::description::NodeDescription;
use super::parameters::NodeParameters;
use crate::client::AbortSignal;
use crate::error::{QueryHumanError, Result};

/// Trait for nodes the host engine can execute.
#[async_trait]
pub trait WorkflowNode: Send + Sync {
    /// Registration metadata and parameter schema.
    fn description(&self) -> NodeDescription;

    /// Run the node over one batch of input items.
    ///
    /// # Returns
    ///
    /// * `Ok(items)` - Output items for the next node
    /// * `Err` - An operation-level failure carrying the underlying cause
    async fn execute(&self, context: &NodeExecutionContext) -> Result<Vec<NodeItem>>;
}

/// One unit of data flowing between nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeItem {
    pub json: Map<String, Value>,
}

impl NodeItem {
    pub fn new(json: Map<String, Value>) -> Self {
        Self { json }
    }

    /// Wrap a JSON object. Anything else is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(json) => Ok(Self { json }),
            other => Err(QueryHumanError::invalid_input(format!(
                "Node items must be JSON objects, got {other}"
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.json.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.json.insert(key.into(), value);
    }
}

/// Everything a node needs for one execution.
#[derive(Debug, Clone)]
pub struct NodeExecutionContext {
    /// Instance name shown in the host, used in error reports
    pub node_name: String,
    /// Resolved parameter values
    pub parameters: NodeParameters,
    /// Input items from the previous node
    pub items: Vec<NodeItem>,
    /// Host-driven cancellation
    pub abort: AbortSignal,
}

impl NodeExecutionContext {
    pub fn new(
        node_name: impl Into<String>,
        parameters: NodeParameters,
        items: Vec<NodeItem>,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            parameters,
            items,
            abort: AbortSignal::never(),
        }
    }

    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }
}
