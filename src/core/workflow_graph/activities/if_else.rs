use super::invalid_properties;
use crate::core::error::AppError;
use crate::core::workflow_graph::activity::{Activity, ActivityExecutionContext, ActivityFactory};
use async_trait::async_trait;
use serde_json::{Map, Value};

const TYPE_NAME: &str = "IfElse";

pub const TRUE: &str = "True";
pub const FALSE: &str = "False";

/// Branches on one state value.
///
/// With `equals` set the outcome is `True` when the value equals it; otherwise when the value
/// is truthy. A missing key is treated as `null`.
pub struct IfElseActivity {
    key: String,
    equals: Option<Value>,
}

impl IfElseActivity {
    pub fn new(key: impl Into<String>, equals: Option<Value>) -> Self {
        Self {
            key: key.into(),
            equals,
        }
    }

    fn evaluate(&self, value: &Value) -> bool {
        match &self.equals {
            Some(expected) => value == expected,
            None => is_truthy(value),
        }
    }
}

#[async_trait]
impl Activity for IfElseActivity {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn execute(
        &mut self,
        ctx: &mut ActivityExecutionContext<'_>,
    ) -> Result<Vec<String>, AppError> {
        let value = ctx.state.get(&self.key).unwrap_or(&Value::Null);
        let outcome = if self.evaluate(value) { TRUE } else { FALSE };
        Ok(vec![outcome.to_string()])
    }
}

pub struct IfElseFactory;

impl ActivityFactory for IfElseFactory {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn create(&self, properties: &Map<String, Value>) -> Result<Box<dyn Activity>, AppError> {
        let key = match properties.get("key") {
            Some(Value::String(key)) if !key.is_empty() => key.clone(),
            _ => return Err(invalid_properties(TYPE_NAME, "key must be a non-empty string")),
        };
        let equals = properties.get("equals").cloned();
        Ok(Box::new(IfElseActivity::new(key, equals)))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
