use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use crate::config::{
    Condition, DateRangeFilter, MetricConfiguration, Operation, Operator, RawCondition,
    RawDateRangeFilter, RawMetricConfiguration,
};
use super::error::ConfigError;

/// Lower-case operation and operator names, recursively
pub fn normalize(raw: &RawMetricConfiguration) -> RawMetricConfiguration {
    RawMetricConfiguration {
        operation: raw.operation.trim().to_lowercase(),
        conditions: raw.conditions.iter().map(normalize_condition).collect(),
        shared_conditions: raw
            .shared_conditions
            .as_ref()
            .map(|conds| conds.iter().map(normalize_condition).collect()),
        sub_configuration: raw
            .sub_configuration
            .as_ref()
            .map(|sub| Box::new(normalize(sub))),
        ..raw.clone()
    }
}

fn normalize_condition(cond: &RawCondition) -> RawCondition {
    RawCondition {
        operator: cond.operator.trim().to_lowercase(),
        ..cond.clone()
    }
}

/// Normalize then validate
pub fn parse_configuration(raw: &RawMetricConfiguration) -> Result<MetricConfiguration, ConfigError> {
    validate(&normalize(raw))
}

/// Validate a normalized configuration and convert it to its typed form
///
/// Checks the operation and every operator against the closed vocabularies,
/// requires field paths where the operation (or a deeper level) needs one,
/// and recurses into the sub-configuration.
pub fn validate(raw: &RawMetricConfiguration) -> Result<MetricConfiguration, ConfigError> {
    let collection = raw
        .collection
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(ConfigError::MissingCollection)?;

    validate_level(raw, collection, &raw.section_path, 0)
}

fn validate_level(
    raw: &RawMetricConfiguration,
    parent_collection: &str,
    parent_section: &[String],
    level: usize,
) -> Result<MetricConfiguration, ConfigError> {
    let operation: Operation = raw.operation.parse()?;

    if level > 0 && operation == Operation::Percentage {
        return Err(ConfigError::NestedPercentage { level });
    }

    let field_path = raw
        .field_path
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string);

    if operation.requires_field() && field_path.is_none() {
        return Err(ConfigError::MissingFieldPath {
            operation: operation.to_string(),
            level,
        });
    }
    if raw.sub_configuration.is_some() && field_path.is_none() {
        return Err(ConfigError::MissingParentField { level });
    }

    let conditions = validate_conditions(&raw.conditions, level)?;
    let shared_conditions = raw
        .shared_conditions
        .as_ref()
        .map(|conds| validate_conditions(conds, level))
        .transpose()?;

    let date_range_filter = raw
        .date_range_filter
        .as_ref()
        .map(validate_date_range)
        .transpose()?;

    // Sub-configurations live in the parent's collection and section.
    let collection = raw
        .collection
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(parent_collection)
        .to_string();
    let section_path = if raw.section_path.is_empty() {
        parent_section.to_vec()
    } else {
        raw.section_path.clone()
    };

    let sub_configuration = raw
        .sub_configuration
        .as_ref()
        .map(|sub| validate_level(sub, &collection, &section_path, level + 1).map(Box::new))
        .transpose()?;

    Ok(MetricConfiguration {
        collection,
        operation,
        field_path,
        section_path,
        conditions,
        sub_configuration,
        date_range_filter,
        shared_conditions,
        label: raw.label.clone(),
    })
}

fn validate_conditions(conditions: &[RawCondition], level: usize) -> Result<Vec<Condition>, ConfigError> {
    conditions
        .iter()
        .map(|c| {
            let operator: Operator = c.operator.parse()?;
            let field = c.field.trim();
            if field.is_empty() {
                return Err(ConfigError::MissingConditionField { level });
            }
            Ok(Condition::new(field, operator, c.value.clone()))
        })
        .collect()
}

fn validate_date_range(raw: &RawDateRangeFilter) -> Result<DateRangeFilter, ConfigError> {
    let path_segments: Vec<String> = raw
        .path_segments
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if path_segments.is_empty() {
        return Err(ConfigError::EmptyDatePath);
    }

    let start = parse_timestamp(&raw.start, false)?;
    let end = parse_timestamp(&raw.end, true)?;
    if start > end {
        return Err(ConfigError::InvertedDateRange {
            start: raw.start.clone(),
            end: raw.end.clone(),
        });
    }

    Ok(DateRangeFilter { path_segments, start, end })
}

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date.
///
/// A bare date is the start of that day, or its last millisecond when
/// `end_of_day` is set, so `[start, end]` stays inclusive of whole days.
pub fn parse_timestamp(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, ConfigError> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ConfigError::InvalidDate(value.to_string()))?;
    let naive = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| ConfigError::InvalidDate(value.to_string()))?;

    Ok(Utc.from_utc_datetime(&naive))
}
