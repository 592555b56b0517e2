//! Shared test utilities for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use metricpipe::{
    parser, Calculator, Catalog, EngineSettings, MemoryRegistry, MemoryStore, MetricConfiguration,
};

pub type TestCalculator = Calculator<MemoryRegistry, MemoryStore>;

/// Load the template catalog from the tests/test_data directory
pub fn load_catalog(name: &str) -> Catalog {
    let path = format!("tests/test_data/{}", name);
    parser::parse_file(&path)
        .unwrap_or_else(|e| panic!("Failed to load test data {}: {}", name, e))
}

/// Load a JSON array of documents into `collection`
pub fn load_documents(store: &MemoryStore, collection: &str, name: &str) {
    let path = format!("tests/test_data/{}", name);
    let json = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read test data {}: {}", name, e));
    store
        .load_json(collection, &json)
        .unwrap_or_else(|e| panic!("Failed to load documents {}: {}", name, e));
}

/// Store holding the student and project fixtures
pub fn fixture_store() -> MemoryStore {
    let store = MemoryStore::new();
    load_documents(&store, "students_data", "students.json");
    load_documents(&store, "projects_data", "projects.json");
    store
}

pub fn calculator() -> TestCalculator {
    calculator_with(Arc::new(fixture_store()), EngineSettings::default())
}

pub fn calculator_with(store: Arc<MemoryStore>, settings: EngineSettings) -> TestCalculator {
    let registry = MemoryRegistry::new(load_catalog("templates.yaml"));
    Calculator::new(Arc::new(registry), store).with_settings(settings)
}

/// Parse a metric configuration, panicking on invalid input
pub fn config(json: &str) -> MetricConfiguration {
    parser::parse_configuration_str(json)
        .unwrap_or_else(|e| panic!("Invalid configuration {}: {}", json, e))
}
