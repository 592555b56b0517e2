//! Configuration flattener (verb module)
//!
//! Turns the recursive `MetricConfiguration` into index-aligned per-level
//! sequences, level 0 being the outermost configuration.

mod flatten;

pub use flatten::{flatten, FlattenedConfiguration, Level};
