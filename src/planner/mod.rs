//! Pipeline planner (verb module)
//!
//! Turns a validated `MetricConfiguration` plus the field kinds of its
//! template into an ordered stage sequence: date filter, section selection,
//! per-level filters, unwinds and joins, then the nested rollup groups.

mod compile;
mod date;
mod error;
mod layout;
mod rollup;
mod stages;

pub use compile::{compile, CompiledPipeline};
pub use date::{build_date_filter, locate_date_field, DateFieldLocator};
pub use error::PlanError;
pub use layout::{plan_layout, Descent, LevelLayout, PipelineLayout, UnwindStep};
pub use rollup::{build_rollups, result_key, DISTINCT_KEY, RESULT_KEY};
pub use stages::{build_section_stages, build_stages, condition_predicate};
