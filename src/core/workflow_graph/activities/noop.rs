use super::DONE;
use crate::core::error::AppError;
use crate::core::workflow_graph::activity::{Activity, ActivityExecutionContext, ActivityFactory};
use async_trait::async_trait;
use serde_json::{Map, Value};

pub struct NoOpActivity;

#[async_trait]
impl Activity for NoOpActivity {
    fn type_name(&self) -> &str {
        "NoOp"
    }

    async fn execute(
        &mut self,
        _ctx: &mut ActivityExecutionContext<'_>,
    ) -> Result<Vec<String>, AppError> {
        Ok(vec![DONE.to_string()])
    }
}

pub struct NoOpFactory;

impl ActivityFactory for NoOpFactory {
    fn type_name(&self) -> &str {
        "NoOp"
    }

    fn create(&self, _properties: &Map<String, Value>) -> Result<Box<dyn Activity>, AppError> {
        Ok(Box::new(NoOpActivity))
    }
}
