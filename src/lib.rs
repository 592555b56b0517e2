//! metricpipe - Compile indicator configurations to document-store aggregation pipelines
//!
//! This library provides:
//! - Template schema types and field-kind introspection
//! - Metric configuration parsing, normalization and validation
//! - Pipeline planning (filters, unwinds, joins, nested rollups)
//! - MongoDB pipeline emission
//! - Async execution against a document store, with batch and percentage support
//!
//! # Architecture
//!
//! **Noun modules** (data structures):
//! - `template/` - template schemas (Catalog, Template, Section, FieldDef) and FieldTypeMap
//! - `config/` - metric configurations (MetricConfiguration, Condition, Indicator)
//! - `pipeline/` - abstract pipeline stages (Stage, Predicate, Expr)
//!
//! **Verb modules** (transformations):
//! - `parser/` - YAML/JSON → Catalog, MetricConfiguration, EngineSettings
//! - `introspector/` - Template → FieldTypeMap (with a per-call SchemaCache)
//! - `validator/` - RawMetricConfiguration → MetricConfiguration
//! - `flattener/` - MetricConfiguration → FlattenedConfiguration
//! - `planner/` - MetricConfiguration + FieldTypeMap → Stage sequence
//! - `emitter/` - Stage sequence → MongoDB pipeline JSON
//! - `store/` - DocumentStore / TemplateRegistry traits and in-memory implementations
//! - `engine/` - Calculator: calculate, calculate_multiple, calculate_indicators, explain
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use metricpipe::{parser, Calculator, MemoryRegistry, MemoryStore};
//!
//! let catalog = parser::parse_file("templates.yaml")?;
//! let calculator = Calculator::new(Arc::new(MemoryRegistry::new(catalog)), Arc::new(MemoryStore::new()));
//! let config = parser::parse_configuration_str(r#"{"collection": "Students", "operation": "count", "sectionPath": "General"}"#)?;
//! let value = calculator.calculate(&config).await?;
//! ```

pub mod template;
pub mod config;
pub mod pipeline;
pub mod parser;
pub mod introspector;
pub mod validator;
pub mod flattener;
pub mod planner;
pub mod emitter;
pub mod store;
pub mod engine;
pub mod error;

// Re-export commonly used types
pub use template::{Catalog, Template, Section, FieldDef, FieldType, FieldKind, FieldTypeMap, TemplateRef};
pub use config::{MetricConfiguration, RawMetricConfiguration, Operation, Operator, Condition, DateRangeFilter, Indicator};
pub use pipeline::{Stage, Predicate, Expr, Literal};
pub use introspector::{resolve_field_types, SchemaCache, IntrospectError};
pub use validator::{normalize, validate, parse_configuration, ConfigError};
pub use flattener::{flatten, FlattenedConfiguration};
pub use planner::{compile, build_stages, build_rollups, build_date_filter, CompiledPipeline, DateFieldLocator, PlanError};
pub use emitter::{emit_pipeline, EmitError};
pub use store::{DocumentStore, TemplateRegistry, MemoryStore, MemoryRegistry, StoreError};
pub use engine::{Calculator, CalculateError, EngineSettings, MetricValue, SeriesPoint, IndicatorValue};
pub use error::ParseError;
