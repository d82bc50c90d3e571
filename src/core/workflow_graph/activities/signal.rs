use super::DONE;
use crate::core::error::AppError;
use crate::core::workflow_graph::activity::{Activity, ActivityExecutionContext, ActivityFactory};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Type name of the generic signal activity.
pub const SIGNAL: &str = "Signal";

/// Event activity: suspends the workflow until an event of its type name arrives.
pub struct SignalActivity {
    name: Arc<str>,
}

#[async_trait]
impl Activity for SignalActivity {
    fn type_name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &mut self,
        _ctx: &mut ActivityExecutionContext<'_>,
    ) -> Result<Vec<String>, AppError> {
        Ok(vec![DONE.to_string()])
    }
}

pub struct SignalFactory {
    name: Arc<str>,
}

impl SignalFactory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
        }
    }
}

impl ActivityFactory for SignalFactory {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn is_event(&self) -> bool {
        true
    }

    fn create(&self, _properties: &Map<String, Value>) -> Result<Box<dyn Activity>, AppError> {
        Ok(Box::new(SignalActivity {
            name: Arc::clone(&self.name),
        }))
    }
}
