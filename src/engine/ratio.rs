//! Percentage metrics
//!
//! A percentage is two independent count pipelines. The denominator drops
//! the configuration's conditions and sub-configuration unless shared
//! conditions are given, in which case it keeps the sub-configuration and
//! filters on the shared conditions only. The numerator always applies its
//! own conditions plus the shared ones.
//!
//! Dropping the sub-configuration also drops any date range declared on it:
//! without shared conditions only the numerator is date filtered.

use tracing::warn;
use crate::config::{MetricConfiguration, Operation};
use super::value::MetricValue;

/// Numerator and denominator configurations of a percentage
pub fn split_percentage(config: &MetricConfiguration) -> (MetricConfiguration, MetricConfiguration) {
    let mut numerator = config.clone();
    numerator.operation = Operation::Count;
    numerator.shared_conditions = None;

    let mut denominator = numerator.clone();
    match &config.shared_conditions {
        Some(shared) => {
            numerator.conditions.extend(shared.iter().cloned());
            denominator.conditions = shared.clone();
        }
        None => {
            denominator.conditions.clear();
            denominator.sub_configuration = None;
        }
    }

    (numerator, denominator)
}

/// `numerator / denominator * 100` rounded to two decimals; `0` when the denominator is `0`
pub fn percentage(numerator: MetricValue, denominator: MetricValue, collection: &str) -> MetricValue {
    let den = denominator.as_f64();
    if den == 0.0 {
        warn!(collection, numerator = %numerator, "percentage denominator is zero, reporting 0");
        return MetricValue::ZERO;
    }
    let ratio = numerator.as_f64() / den * 100.0;
    MetricValue::Float((ratio * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Condition, Operator};
    use crate::parser::parse_configuration_str;

    #[test]
    fn test_split_without_shared_conditions() {
        let config = parse_configuration_str(
            r#"{
                "collection": "Students", "operation": "percentage", "fieldPath": "Events",
                "sectionPath": "Mobility",
                "conditions": [{"field": "Country", "operator": "eq", "value": "FR"}],
                "subConfiguration": {"operation": "count"}
            }"#,
        )
        .unwrap();
        let (numerator, denominator) = split_percentage(&config);

        assert_eq!(numerator.operation, Operation::Count);
        assert_eq!(numerator.conditions.len(), 1);
        assert!(numerator.sub_configuration.is_some());

        assert_eq!(denominator.operation, Operation::Count);
        assert!(denominator.conditions.is_empty());
        assert!(denominator.sub_configuration.is_none());
    }

    #[test]
    fn test_split_with_shared_conditions() {
        let config = parse_configuration_str(
            r#"{
                "collection": "Students", "operation": "percentage", "fieldPath": "Events",
                "sectionPath": "Mobility",
                "conditions": [{"field": "Country", "operator": "eq", "value": "FR"}],
                "sharedConditions": [{"field": "Year", "operator": "gte", "value": 2020}],
                "subConfiguration": {"operation": "count"}
            }"#,
        )
        .unwrap();
        let (numerator, denominator) = split_percentage(&config);
        let shared = Condition::new("Year", Operator::Gte, "2020");

        assert_eq!(numerator.conditions.len(), 2);
        assert!(numerator.conditions.contains(&shared));
        assert_eq!(denominator.conditions, vec![shared]);
        assert!(denominator.sub_configuration.is_some());
        assert!(denominator.shared_conditions.is_none());
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(
            percentage(MetricValue::Int(1), MetricValue::Int(3), "c"),
            MetricValue::Float(33.33)
        );
        assert_eq!(
            percentage(MetricValue::Int(2), MetricValue::Int(3), "c"),
            MetricValue::Float(66.67)
        );
        assert_eq!(
            percentage(MetricValue::Int(5), MetricValue::Int(0), "c"),
            MetricValue::ZERO
        );
    }
}
