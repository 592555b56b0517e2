//! Template, section and field definitions

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A set of templates loaded together (one fixture file, one registry snapshot)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    pub templates: Vec<Template>,
}

impl Catalog {
    /// Get a template by its logical collection name
    pub fn get_template(&self, collection: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == collection)
    }

    /// Get a template by id
    pub fn get_template_by_id(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }
}

/// Schema definition for one logical document collection
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub id: String,
    /// Logical collection name used by metric configurations
    pub name: String,
    /// Physical collection holding the documents. Defaults to `name`.
    #[serde(default)]
    pub storage: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Template {
    /// Name of the physical collection documents live in
    pub fn physical_collection(&self) -> &str {
        self.storage.as_deref().unwrap_or(&self.name)
    }

    /// Reference to this template as a join target
    pub fn as_ref_target(&self) -> TemplateRef {
        TemplateRef {
            id: self.id.clone(),
            collection: self.name.clone(),
            physical_collection: self.physical_collection().to_string(),
        }
    }
}

/// A named group of fields inside a template
#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// A single field definition
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Child fields of a `subform`
    #[serde(default, rename = "subFields", alias = "fields")]
    pub sub_fields: Vec<FieldDef>,
    /// Referenced template id for `table` fields and `select` fields backed by a data source
    #[serde(default, rename = "tableReference", alias = "dataSource")]
    pub table_reference: Option<String>,
}

/// A resolved join target: the referenced template's identity and storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateRef {
    pub id: String,
    pub collection: String,
    pub physical_collection: String,
}

/// Field types a template may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Number,
    File,
    Date,
    Select,
    Subform,
    Table,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::File => "file",
            FieldType::Date => "date",
            FieldType::Select => "select",
            FieldType::Subform => "subform",
            FieldType::Table => "table",
        };
        write!(f, "{}", s)
    }
}

/// Error when parsing a field type string
#[derive(Debug, Clone)]
pub struct ParseFieldTypeError {
    pub input: String,
}

impl fmt::Display for ParseFieldTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid field type '{}'", self.input)
    }
}

impl std::error::Error for ParseFieldTypeError {}

impl FromStr for FieldType {
    type Err = ParseFieldTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" | "text" | "textarea" => Ok(FieldType::String),
            "number" => Ok(FieldType::Number),
            "file" => Ok(FieldType::File),
            "date" => Ok(FieldType::Date),
            "select" => Ok(FieldType::Select),
            "subform" => Ok(FieldType::Subform),
            "table" => Ok(FieldType::Table),
            _ => Err(ParseFieldTypeError { input: s.to_string() }),
        }
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FieldType::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for FieldType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_aliases() {
        assert_eq!("TEXT".parse::<FieldType>().unwrap(), FieldType::String);
        assert_eq!("Subform".parse::<FieldType>().unwrap(), FieldType::Subform);
        assert!("matrix".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_physical_collection_defaults_to_name() {
        let template: Template = serde_yaml::from_str(
            "id: t1\nname: Students\nsections: []\n",
        ).unwrap();
        assert_eq!(template.physical_collection(), "Students");

        let stored: Template = serde_yaml::from_str(
            "id: t2\nname: Projects\nstorage: projects_v2\n",
        ).unwrap();
        assert_eq!(stored.physical_collection(), "projects_v2");
        assert_eq!(stored.as_ref_target().collection, "Projects");
    }

    #[test]
    fn test_data_source_alias() {
        let field: FieldDef = serde_yaml::from_str(
            "name: Advisor\ntype: select\ndataSource: tpl-teachers\n",
        ).unwrap();
        assert_eq!(field.field_type, FieldType::Select);
        assert_eq!(field.table_reference.as_deref(), Some("tpl-teachers"));
    }
}
