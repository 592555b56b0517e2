//! Integration tests for single-level aggregations
//!
//! Runs compiled pipelines end to end against the in-memory store.

mod common;

use std::sync::Arc;
use common::{calculator, calculator_with, config};
use metricpipe::{EngineSettings, MemoryStore, MetricValue};
use serde_json::json;

#[tokio::test]
async fn test_count_rows_of_section() {
    let calc = calculator();

    let general = config(r#"{"collection": "Students", "operation": "count", "sectionPath": "General"}"#);
    assert_eq!(calc.calculate(&general).await.unwrap(), MetricValue::Int(4));

    // s4 has no Mobility section
    let mobility = config(r#"{"collection": "Students", "operation": "count", "sectionPath": "Mobility"}"#);
    assert_eq!(calc.calculate(&mobility).await.unwrap(), MetricValue::Int(3));
}

#[tokio::test]
async fn test_count_expands_subform_chain() {
    let calc = calculator();
    let events = config(
        r#"{"collection": "Students", "operation": "count", "sectionPath": ["Mobility", "Events"]}"#,
    );
    assert_eq!(calc.calculate(&events).await.unwrap(), MetricValue::Int(3));
}

#[tokio::test]
async fn test_numeric_reductions() {
    let calc = calculator();
    let run = |op: &str| {
        config(&format!(
            r#"{{"collection": "Students", "operation": "{}", "fieldPath": "Age", "sectionPath": "General"}}"#,
            op
        ))
    };

    // Ages are 20, "30", 25 and one missing
    assert_eq!(calc.calculate(&run("sum")).await.unwrap(), MetricValue::Int(75));
    assert_eq!(calc.calculate(&run("average")).await.unwrap(), MetricValue::Float(25.0));
    assert_eq!(calc.calculate(&run("max")).await.unwrap(), MetricValue::Int(30));
    assert_eq!(calc.calculate(&run("min")).await.unwrap(), MetricValue::Int(20));
}

#[tokio::test]
async fn test_average_of_nothing_is_zero() {
    let calc = calculator();
    let missing = config(
        r#"{"collection": "Students", "operation": "average", "fieldPath": "Height", "sectionPath": "General"}"#,
    );
    assert_eq!(calc.calculate(&missing).await.unwrap(), MetricValue::ZERO);

    let filtered_out = config(
        r#"{
            "collection": "Students", "operation": "average", "fieldPath": "Age", "sectionPath": "General",
            "conditions": [{"field": "Country", "operator": "eq", "value": "JP"}]
        }"#,
    );
    assert_eq!(calc.calculate(&filtered_out).await.unwrap(), MetricValue::ZERO);
}

#[tokio::test]
async fn test_distinct_counts_unique_values() {
    let calc = calculator();
    let countries = config(
        r#"{"collection": "Students", "operation": "distinct", "fieldPath": "Country", "sectionPath": "General"}"#,
    );
    assert_eq!(calc.calculate(&countries).await.unwrap(), MetricValue::Int(3));
}

#[tokio::test]
async fn test_conditions_are_combined_with_and() {
    let calc = calculator();
    let french = config(
        r#"{
            "collection": "Students", "operation": "count", "sectionPath": "General",
            "conditions": [{"field": "Country", "operator": "eq", "value": "FR"}]
        }"#,
    );
    assert_eq!(calc.calculate(&french).await.unwrap(), MetricValue::Int(2));

    let french_over_21 = config(
        r#"{
            "collection": "Students", "operation": "count", "sectionPath": "General",
            "conditions": [
                {"field": "Country", "operator": "EQ", "value": "FR"},
                {"field": "Age", "operator": "gt", "value": 21}
            ]
        }"#,
    );
    assert_eq!(calc.calculate(&french_over_21).await.unwrap(), MetricValue::Int(1));
}

#[tokio::test]
async fn test_numeric_condition_matches_string_and_number() {
    let calc = calculator();
    // One event stores Rank as 5, another as "5"
    let rank_five = config(
        r#"{
            "collection": "Students", "operation": "count", "sectionPath": ["Mobility", "Events"],
            "conditions": [{"field": "Rank", "operator": "eq", "value": "5"}]
        }"#,
    );
    assert_eq!(calc.calculate(&rank_five).await.unwrap(), MetricValue::Int(2));

    let not_five = config(
        r#"{
            "collection": "Students", "operation": "count", "sectionPath": ["Mobility", "Events"],
            "conditions": [{"field": "Rank", "operator": "ne", "value": 5}]
        }"#,
    );
    assert_eq!(calc.calculate(&not_five).await.unwrap(), MetricValue::Int(1));
}

#[tokio::test]
async fn test_string_stored_ages_join_numeric_comparisons() {
    let calc = calculator();
    // Age "30" is stored as text and is converted before comparing
    let adults = config(
        r#"{
            "collection": "Students", "operation": "count", "sectionPath": "General",
            "conditions": [{"field": "Age", "operator": "gte", "value": "30"}]
        }"#,
    );
    assert_eq!(calc.calculate(&adults).await.unwrap(), MetricValue::Int(1));
}

#[tokio::test]
async fn test_ordered_comparison_converts_text_numbers() {
    let store = MemoryStore::new();
    store.insert_many(
        "students_data",
        vec![
            json!({"General": {"Age": "9"}}),
            json!({"General": {"Age": "100"}}),
            json!({"General": {"Age": 45}}),
            json!({"General": {"Age": "unknown"}}),
        ],
    );
    let calc = calculator_with(Arc::new(store), EngineSettings::default());

    let over_thirty = config(
        r#"{
            "collection": "Students", "operation": "count", "sectionPath": "General",
            "conditions": [{"field": "Age", "operator": "gte", "value": "30"}]
        }"#,
    );
    assert_eq!(calc.calculate(&over_thirty).await.unwrap(), MetricValue::Int(2));

    let under_ten = config(
        r#"{
            "collection": "Students", "operation": "count", "sectionPath": "General",
            "conditions": [{"field": "Age", "operator": "lt", "value": 10}]
        }"#,
    );
    assert_eq!(calc.calculate(&under_ten).await.unwrap(), MetricValue::Int(1));
}
