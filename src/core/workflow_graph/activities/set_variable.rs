use super::{invalid_properties, DONE};
use crate::core::error::AppError;
use crate::core::workflow_graph::activity::{Activity, ActivityExecutionContext, ActivityFactory};
use async_trait::async_trait;
use serde_json::{Map, Value};

const TYPE_NAME: &str = "SetVariable";

/// Merges a fixed set of variables into the workflow state.
pub struct SetVariableActivity {
    variables: Map<String, Value>,
}

impl SetVariableActivity {
    pub fn new(variables: Map<String, Value>) -> Self {
        Self { variables }
    }
}

#[async_trait]
impl Activity for SetVariableActivity {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn execute(
        &mut self,
        ctx: &mut ActivityExecutionContext<'_>,
    ) -> Result<Vec<String>, AppError> {
        for (key, value) in &self.variables {
            ctx.state.set(key.clone(), value.clone());
        }
        Ok(vec![DONE.to_string()])
    }
}

pub struct SetVariableFactory;

impl ActivityFactory for SetVariableFactory {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn create(&self, properties: &Map<String, Value>) -> Result<Box<dyn Activity>, AppError> {
        match properties.get("variables") {
            Some(Value::Object(variables)) => Ok(Box::new(SetVariableActivity::new(variables.clone()))),
            Some(_) => Err(invalid_properties(TYPE_NAME, "variables must be an object")),
            None => Err(invalid_properties(TYPE_NAME, "variables is required")),
        }
    }
}
