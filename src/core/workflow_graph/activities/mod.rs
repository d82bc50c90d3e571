//! Built-in activity types.

pub mod fork;
pub mod if_else;
pub mod noop;
pub mod set_variable;
pub mod signal;

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::core::workflow_graph::activity::ActivityRegistryBuilder;

/// Outcome produced by activities that have a single way to finish.
pub const DONE: &str = "Done";

/// Register the built-in activity types into the supplied builder.
pub fn register_builtins(builder: &mut ActivityRegistryBuilder) {
    builder
        .register(noop::NoOpFactory)
        .register(set_variable::SetVariableFactory)
        .register(if_else::IfElseFactory)
        .register(fork::ForkFactory)
        .register(signal::SignalFactory::new(signal::SIGNAL));
}

/// Register an additional event activity type whose type name is the event name.
pub fn register_signal(builder: &mut ActivityRegistryBuilder, name: impl Into<String>) {
    builder.register(signal::SignalFactory::new(name));
}

pub(crate) fn invalid_properties(type_name: &str, message: impl Into<String>) -> AppError {
    let mut err = AppError::new(
        ErrorCategory::ValidationError,
        format!("{}: {}", type_name, message.into()),
    )
    .with_code("WFG-ACT-002");
    err.add_context("activity_type", type_name);
    err
}
