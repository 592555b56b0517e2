//! Schema introspector (verb module)
//!
//! Template sections → FieldTypeMap, plus the per-invocation schema cache.

mod cache;
mod error;
mod resolve;

pub use cache::{SchemaCache, ResolvedSchema, load_schema};
pub use error::IntrospectError;
pub use resolve::{resolve_field_types, collect_references};
