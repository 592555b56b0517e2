//! Planner errors

use thiserror::Error;

/// A configuration that validated but cannot be turned into stages
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// A join is needed through a table field whose target template is unknown
    #[error("Level {level}: field '{field}' references unknown template '{template}'")]
    UnresolvedJoinTarget {
        level: usize,
        field: String,
        template: String,
    },

    /// A level with a deeper level below it has no field to descend into
    #[error("Level {level}: a field path is required to reach the next level")]
    MissingField { level: usize },
}
