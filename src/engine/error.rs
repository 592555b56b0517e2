use thiserror::Error;
use crate::emitter::EmitError;
use crate::introspector::IntrospectError;
use crate::planner::PlanError;
use crate::store::StoreError;
use crate::validator::ConfigError;

/// Why a single metric could not be calculated
#[derive(Debug, Error)]
pub enum CalculateError {
    #[error(transparent)]
    InvalidConfiguration(#[from] ConfigError),

    /// The configuration validated but cannot be planned against its template
    #[error("Invalid configuration: {0}")]
    Unplannable(#[from] PlanError),

    #[error("Template not found for collection '{0}'")]
    TemplateNotFound(String),

    #[error("Execution failed: {0}")]
    Execution(#[from] StoreError),

    #[error("Pipeline on '{collection}' timed out after {timeout_ms} ms")]
    Timeout { collection: String, timeout_ms: u64 },

    #[error("Failed to render pipeline: {0}")]
    Emit(#[from] EmitError),
}

impl CalculateError {
    /// Whether the configuration itself is at fault, as opposed to data access
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(
            self,
            CalculateError::InvalidConfiguration(_) | CalculateError::Unplannable(_)
        )
    }

    /// Whether fetching data failed (store error or timeout)
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            CalculateError::Execution(_) | CalculateError::Timeout { .. }
        )
    }
}

impl From<IntrospectError> for CalculateError {
    fn from(err: IntrospectError) -> Self {
        match err {
            IntrospectError::TemplateNotFound(collection) => CalculateError::TemplateNotFound(collection),
            IntrospectError::Registry(err) => CalculateError::Execution(err),
        }
    }
}
