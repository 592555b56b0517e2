//! Metric configuration types (noun module)
//!
//! `RawMetricConfiguration` is the wire shape exactly as stored alongside an
//! indicator. `MetricConfiguration` is the validated, typed form the compiler
//! consumes; it can only be produced through the validator.

mod metric;
mod raw;

pub use metric::{MetricConfiguration, Operation, Operator, Condition, DateRangeFilter, Indicator};
pub use raw::{RawMetricConfiguration, RawCondition, RawDateRangeFilter};
