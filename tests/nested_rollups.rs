//! Integration tests for multi-level rollups and table joins

mod common;

use common::{calculator, config};
use metricpipe::{CalculateError, MetricValue, PlanError};

#[tokio::test]
async fn test_count_of_counts_over_events() {
    // Events per student: 2, 0 and 1
    let calc = calculator();
    let events = config(
        r#"{
            "collection": "Students", "operation": "count", "fieldPath": "Events", "sectionPath": "Mobility",
            "subConfiguration": {"operation": "count", "fieldPath": "Events"}
        }"#,
    );
    assert_eq!(calc.calculate(&events).await.unwrap(), MetricValue::Int(3));
}

#[tokio::test]
async fn test_sum_of_award_counts() {
    let calc = calculator();
    let awards = config(
        r#"{
            "collection": "Students", "operation": "sum", "fieldPath": "Awards",
            "sectionPath": ["Mobility", "Events"],
            "subConfiguration": {"operation": "count", "fieldPath": "Awards"}
        }"#,
    );
    assert_eq!(calc.calculate(&awards).await.unwrap(), MetricValue::Int(3));
}

#[tokio::test]
async fn test_sum_of_award_amounts() {
    let calc = calculator();
    // Amounts are 100, "50" and 10
    let amounts = config(
        r#"{
            "collection": "Students", "operation": "sum", "fieldPath": "Awards",
            "sectionPath": ["Mobility", "Events"],
            "subConfiguration": {"operation": "sum", "fieldPath": "Amount"}
        }"#,
    );
    assert_eq!(calc.calculate(&amounts).await.unwrap(), MetricValue::Int(160));
}

#[tokio::test]
async fn test_max_awards_per_event_over_three_levels() {
    let calc = calculator();
    let busiest = config(
        r#"{
            "collection": "Students", "operation": "max", "fieldPath": "Events", "sectionPath": "Mobility",
            "subConfiguration": {
                "operation": "sum", "fieldPath": "Awards",
                "subConfiguration": {"operation": "count"}
            }
        }"#,
    );
    assert_eq!(calc.calculate(&busiest).await.unwrap(), MetricValue::Int(2));
}

#[tokio::test]
async fn test_average_over_per_event_groups() {
    let calc = calculator();
    let per_student = config(
        r#"{
            "collection": "Students", "operation": "average", "fieldPath": "Events", "sectionPath": "Mobility",
            "subConfiguration": {"operation": "count", "fieldPath": "Events"}
        }"#,
    );
    // Each event is its own group, so the average of the per-event counts is 1
    assert_eq!(calc.calculate(&per_student).await.unwrap(), MetricValue::Float(1.0));
}

#[tokio::test]
async fn test_sub_level_conditions_apply_to_elements() {
    let calc = calculator();
    let fair_awards = config(
        r#"{
            "collection": "Students", "operation": "count", "fieldPath": "Events", "sectionPath": "Mobility",
            "subConfiguration": {
                "operation": "count", "fieldPath": "Awards",
                "conditions": [{"field": "Title", "operator": "eq", "value": "Fair"}]
            }
        }"#,
    );
    // Two events are titled "Fair"
    assert_eq!(calc.calculate(&fair_awards).await.unwrap(), MetricValue::Int(2));
}

#[tokio::test]
async fn test_join_reads_joined_document() {
    let calc = calculator();
    // s1 carries its own Info.Budget of 5000 at the top level; only the
    // referenced projects' budgets (1000, "250", "250") may be summed.
    let budgets = config(
        r#"{
            "collection": "Students", "operation": "sum", "fieldPath": "Projects", "sectionPath": "Mobility",
            "subConfiguration": {"operation": "sum", "fieldPath": "Info.Budget"}
        }"#,
    );
    assert_eq!(calc.calculate(&budgets).await.unwrap(), MetricValue::Int(1500));
}

#[tokio::test]
async fn test_join_counts_one_row_per_reference() {
    let calc = calculator();
    let references = config(
        r#"{
            "collection": "Students", "operation": "count", "fieldPath": "Projects", "sectionPath": "Mobility",
            "subConfiguration": {"operation": "count"}
        }"#,
    );
    assert_eq!(calc.calculate(&references).await.unwrap(), MetricValue::Int(3));
}

#[tokio::test]
async fn test_join_through_unknown_template_is_invalid() {
    let calc = calculator();
    let legacy = config(
        r#"{
            "collection": "Students", "operation": "count", "fieldPath": "Legacy", "sectionPath": "Mobility",
            "subConfiguration": {"operation": "count"}
        }"#,
    );
    let err = calc.calculate(&legacy).await.unwrap_err();
    assert!(err.is_invalid_configuration());
    assert!(matches!(
        err,
        CalculateError::Unplannable(PlanError::UnresolvedJoinTarget { ref template, .. }) if template == "tpl-gone"
    ));
}
