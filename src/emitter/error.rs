//! Emitter errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmitError {
    /// A float literal that JSON cannot carry (NaN or infinite)
    #[error("Non-finite number literal: {0}")]
    NonFiniteNumber(f64),
}
