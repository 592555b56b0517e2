//! Document paths of every rollup level
//!
//! Decided once per compile and shared by the stage and rollup builders, so
//! both agree on where each level's field lives after unwinds and joins.

use tracing::warn;
use crate::flattener::FlattenedConfiguration;
use crate::template::{FieldKind, FieldTypeMap, TemplateRef};
use super::error::PlanError;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineLayout {
    /// Section the documents are selected on, `None` when no section path is set
    pub section: Option<String>,
    /// Subform chain of the section path, unwound before the first level
    pub section_unwinds: Vec<UnwindStep>,
    pub levels: Vec<LevelLayout>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnwindStep {
    pub path: String,
    pub index_field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelLayout {
    /// Path conditions of this level are relative to
    pub base: String,
    /// Full path of the level's field
    pub path: Option<String>,
    pub kind: FieldKind,
    /// Whether `base` is the alias of a document joined by the level above
    pub joined: bool,
    pub descent: Descent,
}

/// How the rows of the next level are produced from this one
#[derive(Debug, Clone, PartialEq)]
pub enum Descent {
    /// Innermost level, nothing below
    None,
    Unwind(UnwindStep),
    Join {
        target: TemplateRef,
        /// Field receiving the reference ids cast from `path`
        references: String,
        alias: String,
        index_field: String,
    },
}

impl PipelineLayout {
    /// Index fields recorded by every unwind above `level`, outermost first
    pub fn index_fields_above(&self, level: usize) -> Vec<&str> {
        let sections = self.section_unwinds.iter().map(|u| u.index_field.as_str());
        let levels = self.levels.iter().take(level).filter_map(|l| match &l.descent {
            Descent::None => None,
            Descent::Unwind(step) => Some(step.index_field.as_str()),
            Descent::Join { index_field, .. } => Some(index_field.as_str()),
        });
        sections.chain(levels).collect()
    }
}

pub(crate) fn join_path(base: &str, field: &str) -> String {
    if base.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", base, field)
    }
}

/// Decide the document path of every level
///
/// The first section path entry names the section; the remaining entries are
/// a subform chain inside it. Each level's field is looked up in
/// `field_types` relative to the section. Once a level joins another
/// collection, deeper levels are rooted at the joined document and are not
/// looked up.
pub fn plan_layout(
    flat: &FlattenedConfiguration,
    field_types: &FieldTypeMap,
    section_path: &[String],
) -> Result<PipelineLayout, PlanError> {
    let section = section_path.first().cloned();

    let section_unwinds = (1..section_path.len())
        .map(|k| UnwindStep {
            path: section_path[..=k].join("."),
            index_field: format!("_idx_s{}", k),
        })
        .collect();

    let mut base = section_path.join(".");
    let mut schema_prefix = Some(section_path.get(1..).unwrap_or_default().join("."));
    let mut joined = false;
    let mut levels = Vec::with_capacity(flat.depth());

    for level in flat.levels() {
        let level_base = base.clone();
        let path = level.field.map(|f| join_path(&level_base, f));
        let schema_path = match (&schema_prefix, level.field) {
            (Some(prefix), Some(field)) => Some(join_path(prefix, field)),
            _ => None,
        };

        let kind = match (&section, &schema_path) {
            (Some(section), Some(relative)) => match field_types.get(section, relative) {
                Some(kind) => kind.clone(),
                None => {
                    warn!(section = %section, field = %relative, "field not in template, treating it as scalar");
                    FieldKind::Scalar
                }
            },
            _ => FieldKind::Scalar,
        };

        let descent = if flat.is_last(level.index) {
            Descent::None
        } else {
            let Some(path) = path.clone() else {
                return Err(PlanError::MissingField { level: level.index });
            };

            if let (Some(section), Some(relative)) = (&section, &schema_path) {
                if let Some(template) = field_types.dangling_reference(section, relative) {
                    return Err(PlanError::UnresolvedJoinTarget {
                        level: level.index,
                        field: relative.clone(),
                        template: template.to_string(),
                    });
                }
            }

            let index_field = format!("_idx_l{}", level.index);
            match &kind {
                FieldKind::TableReference(target) => {
                    let alias = format!("_joined_l{}", level.index);
                    base = alias.clone();
                    schema_prefix = None;
                    Descent::Join {
                        target: target.clone(),
                        references: format!("_refs_l{}", level.index),
                        alias,
                        index_field,
                    }
                }
                _ => {
                    base = path.clone();
                    schema_prefix = schema_path.clone();
                    Descent::Unwind(UnwindStep { path, index_field })
                }
            }
        };

        let next_joined = matches!(descent, Descent::Join { .. });
        levels.push(LevelLayout {
            base: level_base,
            path,
            kind,
            joined,
            descent,
        });
        joined = next_joined;
    }

    Ok(PipelineLayout {
        section,
        section_unwinds,
        levels,
    })
}
