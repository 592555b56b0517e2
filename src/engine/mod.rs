//! Calculation engine (verb module)
//!
//! The public entry points: single metrics, labeled series, indicator
//! listings and pipeline explanation. Everything upstream is pure; the
//! engine is where schemas are loaded and pipelines are executed.

mod calculator;
mod error;
mod ratio;
mod settings;
mod value;

pub use calculator::Calculator;
pub use error::CalculateError;
pub use ratio::{percentage, split_percentage};
pub use settings::EngineSettings;
pub use value::{IndicatorValue, MetricValue, SeriesPoint};
