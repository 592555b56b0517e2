//! Template schema types (noun module)
//!
//! A template describes one logical document collection: ordered sections,
//! each holding field definitions. Templates are read-only inputs here.

mod definition;
mod kind;

pub use definition::{Catalog, Template, Section, FieldDef, FieldType, TemplateRef, ParseFieldTypeError};
pub use kind::{FieldKind, FieldTypeMap};
