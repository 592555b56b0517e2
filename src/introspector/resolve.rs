use std::collections::{BTreeSet, HashMap};
use tracing::warn;
use crate::template::{FieldDef, FieldKind, FieldType, FieldTypeMap, Section, TemplateRef};

/// Build the field type map for a template's sections
///
/// Subform children are recorded under `parent.child`, recursively. Table
/// fields are recorded with their target from `targets` (keyed by template
/// id); a table field whose target is unknown is recorded as `Scalar` and
/// marked as a dangling reference.
pub fn resolve_field_types(
    sections: &[Section],
    targets: &HashMap<String, TemplateRef>,
) -> FieldTypeMap {
    let mut map = FieldTypeMap::new();
    for section in sections {
        walk_fields(&mut map, &section.name, "", &section.fields, targets);
    }
    map
}

fn walk_fields(
    map: &mut FieldTypeMap,
    section: &str,
    prefix: &str,
    fields: &[FieldDef],
    targets: &HashMap<String, TemplateRef>,
) {
    for field in fields {
        let path = format!("{}{}", prefix, field.name);

        let kind = match field.field_type {
            FieldType::Subform => FieldKind::SubformContainer,
            FieldType::Date => FieldKind::Date,
            FieldType::Table => match field
                .table_reference
                .as_deref()
                .and_then(|id| targets.get(id))
            {
                Some(target) => FieldKind::TableReference(target.clone()),
                None => {
                    warn!(
                        section,
                        field = %path,
                        reference = ?field.table_reference,
                        "table field references an unknown template"
                    );
                    map.mark_dangling(section, &path, field.table_reference.clone().unwrap_or_default());
                    FieldKind::Scalar
                }
            },
            FieldType::String | FieldType::Number | FieldType::File | FieldType::Select => {
                FieldKind::Scalar
            }
        };

        if map.insert(section, path.clone(), kind).is_some() {
            warn!(section, field = %path, "duplicate field definition, keeping the last one");
        }

        if field.field_type == FieldType::Subform {
            let child_prefix = format!("{}.", path);
            walk_fields(map, section, &child_prefix, &field.sub_fields, targets);
        }
    }
}

/// Ids of every template referenced by a table field, sorted and unique
pub fn collect_references(sections: &[Section]) -> Vec<String> {
    fn collect(fields: &[FieldDef], out: &mut BTreeSet<String>) {
        for field in fields {
            if field.field_type == FieldType::Table {
                if let Some(id) = &field.table_reference {
                    out.insert(id.clone());
                }
            }
            collect(&field.sub_fields, out);
        }
    }

    let mut out = BTreeSet::new();
    for section in sections {
        collect(&section.fields, &mut out);
    }
    out.into_iter().collect()
}
