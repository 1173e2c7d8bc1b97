//! # Query Human Node
//!
//! Pauses a workflow on a question for a human and resumes once the service
//! answers or the timeout passes. Parameters are read once per execution, not
//! per item: one question is asked for the whole batch.

use async_trait::async_trait;
use tracing::{error, info, instrument};

use super::description::{NodeDefaults, NodeDescription, NodeProperty};
use super::parameters::NodeParameters;
use super::traits::{NodeExecutionContext, NodeItem, WorkflowNode};
use crate::client::HumanQueryClient;
use crate::config::{NodeConfig, OutcomeDelivery, QueryHumanConfig};
use crate::constants::{node, parameters};
use crate::error::{QueryHumanError, Result};
use crate::outcome::QueryOutcome;
use crate::query::QueryRequest;

#[derive(Debug, Clone)]
pub struct QueryHumanNode {
    client: HumanQueryClient,
    config: NodeConfig,
}

impl QueryHumanNode {
    pub fn new(config: &QueryHumanConfig) -> Result<Self> {
        Ok(Self::with_client(
            HumanQueryClient::new(config)?,
            config.node.clone(),
        ))
    }

    pub fn with_client(client: HumanQueryClient, config: NodeConfig) -> Self {
        Self { client, config }
    }

    fn read_request(&self, params: &NodeParameters) -> Result<QueryRequest> {
        let default_timeout =
            i64::try_from(self.client.polling_config().default_timeout_seconds).unwrap_or(i64::MAX);

        QueryRequest::builder(
            params.get_string(parameters::API_KEY, "")?,
            params.get_string(parameters::AGENT_ID, "")?,
            params.get_string(parameters::AGENT_NAME, "")?,
            params.get_string(parameters::QUERY_TEXT, "")?,
        )
        .metadata(params.get_string(parameters::METADATA, "")?)
        .timeout_seconds(params.get_i64(parameters::TIMEOUT, default_timeout)?)
        .build()
    }

    fn deliver(&self, items: &[NodeItem], outcome: QueryOutcome) -> Vec<NodeItem> {
        match self.config.outcome_delivery {
            OutcomeDelivery::PassThrough => items.to_vec(),
            OutcomeDelivery::AttachToItems => {
                let value = outcome.into_value();
                items
                    .iter()
                    .cloned()
                    .map(|mut item| {
                        item.insert(self.config.response_field.clone(), value.clone());
                        item
                    })
                    .collect()
            }
        }
    }
}

#[async_trait]
impl WorkflowNode for QueryHumanNode {
    fn description(&self) -> NodeDescription {
        NodeDescription {
            display_name: node::DISPLAY_NAME.to_string(),
            name: node::NAME.to_string(),
            group: vec![node::GROUP.to_string()],
            version: node::VERSION,
            description: node::DESCRIPTION.to_string(),
            defaults: NodeDefaults {
                name: node::DISPLAY_NAME.to_string(),
            },
            inputs: vec![node::MAIN_CONNECTION.to_string()],
            outputs: vec![node::MAIN_CONNECTION.to_string()],
            properties: vec![
                NodeProperty::string(
                    parameters::QUERY_TEXT,
                    "Query Text",
                    "The text of the query to ask the human.",
                )
                .placeholder("Enter your query"),
                NodeProperty::string(
                    parameters::METADATA,
                    "Metadata",
                    "All relevant information about the query, including context and consequences.",
                )
                .placeholder("Enter metadata (optional)"),
                NodeProperty::number(
                    parameters::TIMEOUT,
                    "Timeout (seconds)",
                    self.client.polling_config().default_timeout_seconds,
                    "The maximum amount of time to wait for a response from the human, in seconds. Defaults to 24 hours.",
                ),
                NodeProperty::string(
                    parameters::API_KEY,
                    "API Key",
                    "The API key for authentication.",
                ),
                NodeProperty::string(
                    parameters::AGENT_ID,
                    "Agent ID",
                    "The ID of the agent making the query.",
                ),
                NodeProperty::string(
                    parameters::AGENT_NAME,
                    "Agent Name",
                    "The name of the agent making the query.",
                ),
            ],
        }
    }

    #[instrument(skip_all, fields(node = %context.node_name, items = context.items.len()))]
    async fn execute(&self, context: &NodeExecutionContext) -> Result<Vec<NodeItem>> {
        let outcome = match self.read_request(&context.parameters) {
            Ok(request) => self.client.ask_with_abort(&request, &context.abort).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(outcome) => {
                info!(
                    outcome = outcome.kind(),
                    status = outcome.status(),
                    delivery = ?self.config.outcome_delivery,
                    "Query Human response: {outcome}"
                );
                Ok(self.deliver(&context.items, outcome))
            }
            Err(e) => {
                error!(error = %e, "Query Human node failed");
                Err(QueryHumanError::node_operation(&context.node_name, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AbortHandle, QueryTransport, TransportError, TransportResponse};
    use crate::config::PollingConfig;
    use crate::node::description::PropertyType;
    use crate::query::QueryPayload;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Always answers with a fixed response, recording payloads.
    struct FixedTransport {
        response: Option<TransportResponse>,
        payloads: Mutex<Vec<Value>>,
    }

    impl FixedTransport {
        fn answering(status: u16, body: Value) -> Arc<Self> {
            Arc::new(Self {
                response: Some(TransportResponse { status, body }),
                payloads: Mutex::new(Vec::new()),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                response: None,
                payloads: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl QueryTransport for FixedTransport {
        fn endpoint(&self) -> &str {
            "fixed://queryHuman"
        }

        async fn submit(
            &self,
            payload: &QueryPayload<'_>,
            _attempt_timeout: Duration,
        ) -> std::result::Result<TransportResponse, TransportError> {
            self.payloads
                .lock()
                .unwrap()
                .push(serde_json::to_value(payload).unwrap());
            self.response
                .clone()
                .ok_or_else(|| TransportError::Connect("unreachable".to_string()))
        }
    }

    fn node_with(transport: Arc<FixedTransport>, delivery: OutcomeDelivery) -> QueryHumanNode {
        QueryHumanNode::with_client(
            HumanQueryClient::with_transport(transport, PollingConfig::default()),
            NodeConfig {
                outcome_delivery: delivery,
                ..NodeConfig::default()
            },
        )
    }

    fn params() -> NodeParameters {
        NodeParameters::new()
            .with("queryText", "Proceed?")
            .with("metadata", "nightly deploy")
            .with("timeout", 10)
            .with("apiKey", "k")
            .with("agentID", "a1")
            .with("agentName", "Agent")
    }

    fn items() -> Vec<NodeItem> {
        vec![
            NodeItem::from_value(json!({"id": 1})).unwrap(),
            NodeItem::from_value(json!({"id": 2})).unwrap(),
        ]
    }

    #[test]
    fn test_description_matches_registered_schema() {
        let node = node_with(FixedTransport::unreachable(), OutcomeDelivery::PassThrough);
        let description = node.description();

        assert_eq!(description.name, "queryHuman");
        assert_eq!(description.display_name, "Query Human");
        let names: Vec<_> = description.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            ["queryText", "metadata", "timeout", "apiKey", "agentID", "agentName"]
        );

        let schema = serde_json::to_value(&description).unwrap();
        assert_eq!(schema["displayName"], json!("Query Human"));
        assert_eq!(schema["defaults"], json!({"name": "Query Human"}));
        assert_eq!(schema["properties"][2]["type"], json!("number"));
        assert_eq!(schema["properties"][2]["default"], json!(86_400));
        assert_eq!(schema["properties"][0]["placeholder"], json!("Enter your query"));
        assert!(schema["properties"][3].get("placeholder").is_none());

        let timeout = description.property("timeout").unwrap();
        assert_eq!(timeout.kind, PropertyType::Number);
        assert!(description.property("callbackUrl").is_none());
    }

    #[tokio::test]
    async fn test_pass_through_returns_items_unchanged() {
        let transport = FixedTransport::answering(200, json!({"answer": "yes"}));
        let node = node_with(transport.clone(), OutcomeDelivery::PassThrough);
        let context = NodeExecutionContext::new("Query Human", params(), items());

        let output = node.execute(&context).await.unwrap();

        assert_eq!(output, items());
        let sent = transport.payloads.lock().unwrap()[0].clone();
        assert_eq!(sent["query"], json!("Proceed?"));
        assert_eq!(sent["metadata"], json!("nightly deploy"));
        assert_eq!(sent["agentID"], json!("a1"));
    }

    #[tokio::test]
    async fn test_attach_to_items_adds_the_outcome() {
        let transport = FixedTransport::answering(500, json!({"error": "bad key"}));
        let node = node_with(transport, OutcomeDelivery::AttachToItems);
        let context = NodeExecutionContext::new("Query Human", params(), items());

        let output = node.execute(&context).await.unwrap();

        assert_eq!(output.len(), 2);
        for (item, id) in output.iter().zip([1, 2]) {
            assert_eq!(item.get("id"), Some(&json!(id)));
            assert_eq!(item.get("response"), Some(&json!({"error": "bad key"})));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_marker_is_attached() {
        let node = node_with(FixedTransport::unreachable(), OutcomeDelivery::AttachToItems);
        let context = NodeExecutionContext::new(
            "Query Human",
            params().with("timeout", 2),
            items(),
        );

        let output = node.execute(&context).await.unwrap();
        assert_eq!(output[0].get("response"), Some(&json!("Timeout occurred")));
    }

    #[tokio::test]
    async fn test_bad_parameters_become_node_operation_errors() {
        let transport = FixedTransport::answering(200, json!({}));
        let node = node_with(transport.clone(), OutcomeDelivery::PassThrough);

        for bad in [params().with("timeout", -1), params().with("apiKey", json!(["k"]))] {
            let context = NodeExecutionContext::new("Ask Ops", bad, items());
            let err = node.execute(&context).await.unwrap_err();

            assert!(matches!(&err, QueryHumanError::NodeOperation { node, .. } if node == "Ask Ops"));
            assert!(matches!(err.root_cause(), QueryHumanError::InvalidInput(_)));
        }
        assert!(transport.payloads.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_host_abort_fails_the_node() {
        let node = node_with(FixedTransport::unreachable(), OutcomeDelivery::PassThrough);
        let (handle, signal) = AbortHandle::new();
        let context = NodeExecutionContext::new("Query Human", params().with("timeout", 3600), items())
            .with_abort(signal);

        handle.abort();
        let err = node.execute(&context).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
