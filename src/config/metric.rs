//! Validated metric configuration

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use super::raw::RawMetricConfiguration;
use crate::validator::{self, ConfigError};

/// Declarative description of one indicator's computation
///
/// Built only by [`validator::parse_configuration`]; deserializing goes through
/// the same path so an invalid configuration never exists in typed form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawMetricConfiguration")]
pub struct MetricConfiguration {
    pub collection: String,
    pub operation: Operation,
    /// Required unless the operation is `count` on the innermost level
    pub field_path: Option<String>,
    pub section_path: Vec<String>,
    /// AND-combined
    pub conditions: Vec<Condition>,
    /// Next rollup level; its field path is scoped under this level's array
    pub sub_configuration: Option<Box<MetricConfiguration>>,
    pub date_range_filter: Option<DateRangeFilter>,
    pub shared_conditions: Option<Vec<Condition>>,
    pub label: Option<String>,
}

impl TryFrom<RawMetricConfiguration> for MetricConfiguration {
    type Error = ConfigError;

    fn try_from(raw: RawMetricConfiguration) -> Result<Self, Self::Error> {
        validator::parse_configuration(&raw)
    }
}

impl MetricConfiguration {
    /// Label used in multi-series results: explicit label, else the collection name
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.collection)
    }

    /// Number of rollup levels (1 + number of sub-configuration links)
    pub fn depth(&self) -> usize {
        1 + self.sub_configuration.as_ref().map(|s| s.depth()).unwrap_or(0)
    }

    /// First date range found walking from this level inward
    pub fn effective_date_range(&self) -> Option<&DateRangeFilter> {
        self.date_range_filter.as_ref().or_else(|| {
            self.sub_configuration
                .as_ref()
                .and_then(|s| s.effective_date_range())
        })
    }

    /// Replace the bounds of every configured date range, keeping its path
    pub fn with_date_bounds(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if let Some(range) = self.date_range_filter.as_mut() {
            range.start = start;
            range.end = end;
        }
        if let Some(sub) = self.sub_configuration.take() {
            self.sub_configuration = Some(Box::new(sub.with_date_bounds(start, end)));
        }
        self
    }
}

/// The closed set of aggregation operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Count,
    Sum,
    Average,
    Max,
    Min,
    Distinct,
    Percentage,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Count,
        Operation::Sum,
        Operation::Average,
        Operation::Max,
        Operation::Min,
        Operation::Distinct,
        Operation::Percentage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Count => "count",
            Operation::Sum => "sum",
            Operation::Average => "average",
            Operation::Max => "max",
            Operation::Min => "min",
            Operation::Distinct => "distinct",
            Operation::Percentage => "percentage",
        }
    }

    /// Whether the operation reads a field value (everything except `count`)
    pub fn requires_field(&self) -> bool {
        !matches!(self, Operation::Count)
    }

    /// Whether the operand is reduced numerically
    pub fn is_numeric(&self) -> bool {
        matches!(self, Operation::Sum | Operation::Average | Operation::Max | Operation::Min)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .find(|op| op.as_str() == s)
            .copied()
            .ok_or_else(|| ConfigError::UnknownOperation(s.to_string()))
    }
}

/// The closed set of comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Gt,
    Lt,
    Ne,
    Gte,
    Lte,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::Eq,
        Operator::Gt,
        Operator::Lt,
        Operator::Ne,
        Operator::Gte,
        Operator::Lte,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Ne => "ne",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .find(|op| op.as_str() == s)
            .copied()
            .ok_or_else(|| ConfigError::UnknownOperator(s.to_string()))
    }
}

/// A single filter condition, relative to the level it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// The value as a number, when it looks like one
    pub fn numeric_value(&self) -> Option<f64> {
        let trimmed = self.value.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
    }
}

/// Inclusive date window over a date field located by `path_segments`
#[derive(Debug, Clone, PartialEq)]
pub struct DateRangeFilter {
    pub path_segments: Vec<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A named indicator carrying its metric configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Indicator {
    pub id: String,
    pub name: String,
    #[serde(rename = "metricConfiguration", alias = "configuration")]
    pub configuration: MetricConfiguration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_round_trip_names() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        assert!(matches!(
            "median".parse::<Operation>(),
            Err(ConfigError::UnknownOperation(s)) if s == "median"
        ));
    }

    #[test]
    fn test_numeric_value_detection() {
        assert_eq!(Condition::new("a", Operator::Eq, "5").numeric_value(), Some(5.0));
        assert_eq!(Condition::new("a", Operator::Eq, " 2.5 ").numeric_value(), Some(2.5));
        assert_eq!(Condition::new("a", Operator::Eq, "five").numeric_value(), None);
        assert_eq!(Condition::new("a", Operator::Eq, "").numeric_value(), None);
        assert_eq!(Condition::new("a", Operator::Eq, "NaN").numeric_value(), None);
    }

    #[test]
    fn test_display_label_falls_back_to_collection() {
        let config: MetricConfiguration = serde_json::from_str(
            r#"{"collection": "Students", "operation": "count"}"#,
        ).unwrap();
        assert_eq!(config.display_label(), "Students");

        let labeled: MetricConfiguration = serde_json::from_str(
            r#"{"collection": "Students", "operation": "count", "label": "Enrolled"}"#,
        ).unwrap();
        assert_eq!(labeled.display_label(), "Enrolled");
    }

    #[test]
    fn test_invalid_configuration_does_not_deserialize() {
        let result = serde_json::from_str::<MetricConfiguration>(
            r#"{"collection": "Students", "operation": "sum"}"#,
        );
        assert!(result.is_err());
    }
}
