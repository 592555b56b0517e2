//! Pipeline emitter (verb module)
//!
//! Renders a stage sequence as a MongoDB aggregation pipeline (JSON).

mod emit;
mod error;

pub use emit::{emit_pipeline, emit_stage};
pub use error::EmitError;
