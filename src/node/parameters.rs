//! Typed access to node parameter values resolved by the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{QueryHumanError, Result};

/// Parameter values keyed by parameter name. Missing and `null` values fall
/// back to the caller's default; present values of the wrong type are errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeParameters {
    values: HashMap<String, Value>,
}

impl NodeParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|value| !value.is_null())
    }

    pub fn get_string(&self, name: &str, default: &str) -> Result<String> {
        match self.get(name) {
            None => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(wrong_type(name, "a string", other)),
        }
    }

    /// Integer parameter. Accepts whole floats and numeric strings, which is
    /// what hosts produce for number fields and expressions.
    pub fn get_i64(&self, name: &str, default: i64) -> Result<i64> {
        let Some(value) = self.get(name) else {
            return Ok(default);
        };

        let parsed = match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };

        parsed.ok_or_else(|| wrong_type(name, "a whole number", value))
    }
}

impl From<HashMap<String, Value>> for NodeParameters {
    fn from(values: HashMap<String, Value>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for NodeParameters {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

fn wrong_type(name: &str, expected: &str, actual: &Value) -> QueryHumanError {
    QueryHumanError::invalid_input(format!(
        "Parameter '{name}' must be {expected}, got {actual}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strings_fall_back_when_missing_or_null() {
        let params = NodeParameters::new()
            .with("queryText", "Proceed?")
            .with("metadata", Value::Null);

        assert_eq!(params.get_string("queryText", "").unwrap(), "Proceed?");
        assert_eq!(params.get_string("metadata", "").unwrap(), "");
        assert_eq!(params.get_string("agentName", "anon").unwrap(), "anon");
    }

    #[test]
    fn test_wrong_string_type_is_rejected() {
        let params = NodeParameters::new().with("apiKey", 42);
        let err = params.get_string("apiKey", "").unwrap_err();
        assert!(err.to_string().contains("'apiKey' must be a string"));
    }

    #[test]
    fn test_integers_accept_host_shapes() {
        let params: NodeParameters = [
            ("int", json!(60)),
            ("float", json!(60.0)),
            ("text", json!(" 60 ")),
            ("negative", json!(-5)),
            ("fraction", json!(1.5)),
            ("flag", json!(true)),
        ]
        .into_iter()
        .collect();

        assert_eq!(params.get_i64("int", 0).unwrap(), 60);
        assert_eq!(params.get_i64("float", 0).unwrap(), 60);
        assert_eq!(params.get_i64("text", 0).unwrap(), 60);
        assert_eq!(params.get_i64("negative", 0).unwrap(), -5);
        assert_eq!(params.get_i64("missing", 86_400).unwrap(), 86_400);
        assert!(params.get_i64("fraction", 0).is_err());
        assert!(params.get_i64("flag", 0).is_err());
    }
}
