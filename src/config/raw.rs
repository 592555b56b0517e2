//! Wire shape of a metric configuration

use serde::{Deserialize, Deserializer, Serialize};

/// A metric configuration as stored, before normalization and validation
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetricConfiguration {
    /// Logical dataset name. Sub-configurations inherit the parent's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default)]
    pub operation: String,
    #[serde(default, alias = "field", skip_serializing_if = "Option::is_none")]
    pub field_path: Option<String>,
    /// Section name, optionally followed by a subform chain. A bare string is accepted.
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub section_path: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<RawCondition>,
    #[serde(default, alias = "subConfiguracion", skip_serializing_if = "Option::is_none")]
    pub sub_configuration: Option<Box<RawMetricConfiguration>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range_filter: Option<RawDateRangeFilter>,
    /// Conditions kept on both sides of a percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_conditions: Option<Vec<RawCondition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A single filter condition as stored
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawCondition {
    pub field: String,
    pub operator: String,
    /// Numbers and booleans are accepted and kept in their textual form
    #[serde(deserialize_with = "value_as_string")]
    pub value: String,
}

/// Date range as stored; bounds are RFC 3339 timestamps or plain `YYYY-MM-DD` dates
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDateRangeFilter {
    pub path_segments: Vec<String>,
    pub start: String,
    pub end: String,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(OneOrMany::One(s)) if s.is_empty() => Ok(Vec::new()),
        Some(OneOrMany::One(s)) => Ok(vec![s]),
        Some(OneOrMany::Many(v)) => Ok(v),
    }
}

fn value_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "condition value must be a scalar, got {}",
            other
        ))),
    }
}
