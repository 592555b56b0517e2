use std::fmt;
use serde::Serialize;
use serde_json::Value;

/// A metric result: integer or float, `0` when there is no data
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
}

impl MetricValue {
    pub const ZERO: MetricValue = MetricValue::Int(0);

    /// Read a result field; anything that is not a number counts as no data
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(MetricValue::Int)
                .or_else(|| n.as_f64().map(MetricValue::Float))
                .unwrap_or(MetricValue::ZERO),
            _ => MetricValue::ZERO,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Int(i) => *i as f64,
            MetricValue::Float(f) => *f,
        }
    }
}

// Stores may return an integral sum as either 6 or 6.0
impl PartialEq for MetricValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_f64() == other.as_f64()
    }
}

impl Default for MetricValue {
    fn default() -> Self {
        MetricValue::ZERO
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Int(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Float(value)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(i) => write!(f, "{}", i),
            MetricValue::Float(x) => write!(f, "{}", x),
        }
    }
}

/// One entry of a labeled series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: MetricValue,
}

/// One entry of an indicator listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorValue {
    pub id: String,
    pub name: String,
    pub value: MetricValue,
    /// Why the value fell back to `0`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
