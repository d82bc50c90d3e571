use super::invalid_properties;
use crate::core::error::AppError;
use crate::core::workflow_graph::activity::{Activity, ActivityExecutionContext, ActivityFactory};
use async_trait::async_trait;
use serde_json::{Map, Value};

const TYPE_NAME: &str = "Fork";

/// Emits every configured branch label, in order.
pub struct ForkActivity {
    branches: Vec<String>,
}

#[async_trait]
impl Activity for ForkActivity {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn execute(
        &mut self,
        _ctx: &mut ActivityExecutionContext<'_>,
    ) -> Result<Vec<String>, AppError> {
        Ok(self.branches.clone())
    }
}

pub struct ForkFactory;

impl ActivityFactory for ForkFactory {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn create(&self, properties: &Map<String, Value>) -> Result<Box<dyn Activity>, AppError> {
        let Some(Value::Array(items)) = properties.get("branches") else {
            return Err(invalid_properties(TYPE_NAME, "branches must be a list"));
        };
        let branches = items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid_properties(TYPE_NAME, "branch labels must be strings"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Box::new(ForkActivity { branches }))
    }
}
