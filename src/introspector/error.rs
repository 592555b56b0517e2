use thiserror::Error;
use crate::store::StoreError;

/// Errors loading a template schema
#[derive(Debug, Error)]
pub enum IntrospectError {
    #[error("Template not found for collection '{0}'")]
    TemplateNotFound(String),

    #[error("Template registry error: {0}")]
    Registry(#[from] StoreError),
}
