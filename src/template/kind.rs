//! Field kinds as seen by the compiler

use std::collections::HashMap;
use super::definition::TemplateRef;

/// How the compiler must treat a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain value (string, number, file, select)
    Scalar,
    /// Date value, usable by date range filters
    Date,
    /// Identifiers pointing at documents of another template; needs a join
    TableReference(TemplateRef),
    /// Array of sub-documents
    SubformContainer,
}

/// Dot-joined field path (relative to its section) → field kind, per section
#[derive(Debug, Clone, Default)]
pub struct FieldTypeMap {
    sections: HashMap<String, HashMap<String, FieldKind>>,
    /// Table fields whose referenced template could not be found: (section, path) → template id
    dangling: HashMap<(String, String), String>,
}

impl FieldTypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a field kind. Returns the previous kind if the path was already present.
    pub fn insert(
        &mut self,
        section: impl Into<String>,
        path: impl Into<String>,
        kind: FieldKind,
    ) -> Option<FieldKind> {
        self.sections
            .entry(section.into())
            .or_default()
            .insert(path.into(), kind)
    }

    /// Look up a field kind, `None` when the path is not in the schema
    pub fn get(&self, section: &str, path: &str) -> Option<&FieldKind> {
        self.sections.get(section)?.get(path)
    }

    /// Remember a table field whose target template is unknown
    pub fn mark_dangling(&mut self, section: &str, path: &str, template_id: String) {
        self.dangling
            .insert((section.to_string(), path.to_string()), template_id);
    }

    /// Template id of a table field whose target could not be resolved
    pub fn dangling_reference(&self, section: &str, path: &str) -> Option<&str> {
        self.dangling
            .get(&(section.to_string(), path.to_string()))
            .map(|s| s.as_str())
    }

    /// Total number of recorded paths across all sections
    pub fn len(&self) -> usize {
        self.sections.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of every section with at least one field, sorted
    pub fn section_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sections.keys().map(|k| k.as_str()).collect();
        names.sort();
        names
    }

    /// All paths recorded for one section, sorted
    pub fn paths(&self, section: &str) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .sections
            .get(section)
            .map(|s| s.keys().map(|k| k.as_str()).collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }
}
