#![allow(clippy::result_large_err)]

use super::EngineConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &EngineConfig) -> Result<(), AppError> {
        if config.engine.state_dir.as_os_str().is_empty() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "engine.state_dir cannot be empty",
            ));
        }
        if config.engine.definitions_dir.as_os_str().is_empty() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "engine.definitions_dir cannot be empty",
            ));
        }
        Ok(())
    }
}
