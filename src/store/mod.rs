//! Collaborator contracts (verb module)
//!
//! The document store and template registry the compiler reads from, plus
//! in-memory implementations that evaluate the stage vocabulary over JSON
//! documents.

mod error;
mod eval;
mod memory;
mod traits;

pub use error::StoreError;
pub use eval::run_pipeline;
pub use memory::{MemoryStore, MemoryRegistry};
pub use traits::{DocumentStore, TemplateRegistry, ResultStream};
