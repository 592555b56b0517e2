//! Configuration validation errors

use thiserror::Error;

/// Why a metric configuration was rejected
///
/// Raised before any pipeline is built. `level` is 0 for the outermost
/// configuration and grows by one per `subConfiguration` link.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: collection is required")]
    MissingCollection,

    #[error("Invalid configuration: unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("Invalid configuration: unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("Invalid configuration: operation '{operation}' at level {level} requires a field path")]
    MissingFieldPath { operation: String, level: usize },

    #[error("Invalid configuration: level {level} has a sub-configuration but no field path to descend into")]
    MissingParentField { level: usize },

    #[error("Invalid configuration: condition at level {level} has no field")]
    MissingConditionField { level: usize },

    #[error("Invalid configuration: percentage is only allowed on the outermost level (found at level {level})")]
    NestedPercentage { level: usize },

    #[error("Invalid configuration: date range needs at least one path segment")]
    EmptyDatePath,

    #[error("Invalid configuration: '{0}' is not a valid date or timestamp")]
    InvalidDate(String),

    #[error("Invalid configuration: date range start {start} is after end {end}")]
    InvertedDateRange { start: String, end: String },
}
