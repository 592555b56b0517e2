//! Parser (verb module)
//!
//! Template catalogs and engine settings come from YAML files; metric
//! configurations and indicators from the JSON they are stored as.

use std::path::Path;
use crate::config::{Indicator, MetricConfiguration, RawMetricConfiguration};
use crate::engine::EngineSettings;
use crate::error::ParseError;
use crate::template::Catalog;
use crate::validator;

fn read_file<P: AsRef<Path>>(path: P) -> Result<String, ParseError> {
    let path_str = path.as_ref().display().to_string();
    std::fs::read_to_string(&path).map_err(|e| ParseError::Io {
        path: path_str,
        source: e,
    })
}

/// Parse a template catalog from a YAML file
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Catalog, ParseError> {
    parse_str(&read_file(path)?)
}

/// Parse a template catalog from a YAML string
pub fn parse_str(yaml: &str) -> Result<Catalog, ParseError> {
    serde_yaml::from_str(yaml).map_err(ParseError::from)
}

/// Parse, normalize and validate one metric configuration from JSON
pub fn parse_configuration_str(json: &str) -> Result<MetricConfiguration, ParseError> {
    let raw: RawMetricConfiguration = serde_json::from_str(json)?;
    Ok(validator::parse_configuration(&raw)?)
}

/// Parse a JSON array of metric configurations, failing on the first invalid one
pub fn parse_configurations_str(json: &str) -> Result<Vec<MetricConfiguration>, ParseError> {
    let raws: Vec<RawMetricConfiguration> = serde_json::from_str(json)?;
    raws.iter()
        .map(|raw| validator::parse_configuration(raw).map_err(ParseError::from))
        .collect()
}

/// Parse a JSON array of indicators
pub fn parse_indicators_str(json: &str) -> Result<Vec<Indicator>, ParseError> {
    serde_json::from_str(json).map_err(ParseError::from)
}

/// Parse engine settings from a YAML file
pub fn parse_settings_file<P: AsRef<Path>>(path: P) -> Result<EngineSettings, ParseError> {
    parse_settings_str(&read_file(path)?)
}

/// Parse engine settings from a YAML string; missing keys take their defaults
pub fn parse_settings_str(yaml: &str) -> Result<EngineSettings, ParseError> {
    if yaml.trim().is_empty() {
        return Ok(EngineSettings::default());
    }
    serde_yaml::from_str(yaml).map_err(ParseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Operation;
    use crate::planner::DateFieldLocator;
    use crate::template::FieldType;
    use crate::validator::ConfigError;

    #[test]
    fn test_parse_catalog() {
        let catalog = parse_str(
            r#"
templates:
  - id: t1
    name: Students
    sections:
      - name: General
        fields:
          - { name: Name, type: text }
          - { name: Trips, type: subform, subFields: [{ name: When, type: date }] }
"#,
        )
        .unwrap();

        let template = catalog.get_template("Students").unwrap();
        assert_eq!(template.physical_collection(), "Students");
        let trips = &template.sections[0].fields[1];
        assert_eq!(trips.name, "Trips");
        assert_eq!(trips.field_type, FieldType::Subform);
        assert_eq!(trips.sub_fields[0].field_type, FieldType::Date);
    }

    #[test]
    fn test_parse_configuration_validates() {
        let config = parse_configuration_str(
            r#"{"collection": "Students", "operation": "Sum", "field": "Age", "sectionPath": "General"}"#,
        )
        .unwrap();
        assert_eq!(config.operation, Operation::Sum);
        assert_eq!(config.field_path.as_deref(), Some("Age"));

        let err = parse_configuration_str(r#"{"collection": "Students", "operation": "median"}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidConfiguration(ConfigError::UnknownOperation(ref op)) if op == "median"
        ));

        assert!(matches!(parse_configuration_str("{"), Err(ParseError::Json(_))));
    }

    #[test]
    fn test_parse_indicators() {
        let indicators = parse_indicators_str(
            r#"[{"id": "i1", "name": "Students", "metricConfiguration": {"collection": "Students", "operation": "count"}}]"#,
        )
        .unwrap();
        assert_eq!(indicators.len(), 1);
        assert_eq!(indicators[0].configuration.operation, Operation::Count);
    }

    #[test]
    fn test_parse_settings() {
        let settings = parse_settings_str("query_timeout_ms: 500\ndate_field_locator: section_relative\n").unwrap();
        assert_eq!(settings.query_timeout_ms, 500);
        assert_eq!(settings.max_concurrency, EngineSettings::default().max_concurrency);
        assert_eq!(settings.date_field_locator, DateFieldLocator::SectionRelative);

        assert_eq!(parse_settings_str("").unwrap(), EngineSettings::default());
        assert!(parse_settings_str("date_field_locator: nearest").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            parse_file("does/not/exist.yaml"),
            Err(ParseError::Io { .. })
        ));
    }
}
