//! Configuration normalizer/validator (verb module)
//!
//! RawMetricConfiguration → normalized RawMetricConfiguration → MetricConfiguration.

mod error;
mod validate;

pub use error::ConfigError;
pub use validate::{normalize, validate, parse_configuration, parse_timestamp};
