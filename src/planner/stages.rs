//! Section selection and per-level filter, unwind and join stages

use crate::config::{Condition, Operator};
use crate::flattener::FlattenedConfiguration;
use crate::pipeline::{
    Comparison, Expr, Join, Literal, Predicate, Project, ProjectExpr, Stage, Unwind,
};
use super::layout::{join_path, Descent, PipelineLayout};

/// Keep documents that carry the section, then unwind its subform chain
pub fn build_section_stages(layout: &PipelineLayout) -> Vec<Stage> {
    let mut stages = Vec::new();
    if let Some(section) = &layout.section {
        stages.push(Stage::filter(Predicate::Exists(section.clone())));
    }
    for step in &layout.section_unwinds {
        stages.push(Stage::Unwind(Unwind {
            path: step.path.clone(),
            index_field: Some(step.index_field.clone()),
        }));
    }
    stages
}

/// Filters, unwinds and joins for every level, outermost first
pub fn build_stages(flat: &FlattenedConfiguration, layout: &PipelineLayout) -> Vec<Stage> {
    let mut stages = Vec::new();

    for (level, placed) in flat.levels().zip(&layout.levels) {
        if !level.conditions.is_empty() {
            let predicates = level
                .conditions
                .iter()
                .map(|c| condition_predicate(&placed.base, c))
                .collect();
            stages.push(Stage::filter(Predicate::all(predicates)));
        }

        match &placed.descent {
            Descent::None => {}
            Descent::Unwind(step) => stages.push(Stage::Unwind(Unwind {
                path: step.path.clone(),
                index_field: Some(step.index_field.clone()),
            })),
            Descent::Join {
                target,
                references,
                alias,
                index_field,
            } => {
                // Join descent is only planned for levels with a field
                let source = placed.path.clone().unwrap_or_default();
                stages.push(Stage::Project(Project {
                    fields: vec![ProjectExpr {
                        expr: Expr::ToReferences(Box::new(Expr::Field(source))),
                        alias: references.clone(),
                    }],
                    retain_input: true,
                }));
                stages.push(Stage::Join(Join {
                    from: target.physical_collection.clone(),
                    local_field: references.clone(),
                    foreign_field: "_id".to_string(),
                    alias: alias.clone(),
                }));
                stages.push(Stage::Unwind(Unwind {
                    path: alias.clone(),
                    index_field: Some(index_field.clone()),
                }));
            }
        }
    }

    stages
}

pub(crate) fn comparison(operator: Operator) -> Comparison {
    match operator {
        Operator::Eq => Comparison::Equals,
        Operator::Gt => Comparison::Greater,
        Operator::Lt => Comparison::Less,
        Operator::Ne => Comparison::NotEquals,
        Operator::Gte => Comparison::GreaterOrEqual,
        Operator::Lte => Comparison::LessOrEqual,
    }
}

/// Predicate for one condition, rooted at `base`
///
/// A numeric-looking value matches both its string and its number form.
/// For `ne` neither form may match. Ordered operators compare the stored
/// value converted to a number, so `"9"` sorts below `30`.
pub fn condition_predicate(base: &str, condition: &Condition) -> Predicate {
    let path = join_path(base, &condition.field);
    let op = comparison(condition.operator);
    let text = Predicate::compare(path.clone(), op, Literal::String(condition.value.clone()));

    let Some(number) = condition.numeric_value() else {
        return text;
    };
    match op {
        Comparison::Equals => {
            Predicate::Or(vec![text, Predicate::compare(path, op, Literal::number(number))])
        }
        Comparison::NotEquals => {
            Predicate::And(vec![text, Predicate::compare(path, op, Literal::number(number))])
        }
        _ => Predicate::CompareAsNumber {
            path,
            op,
            value: Literal::number(number),
        },
    }
}
