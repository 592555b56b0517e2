//! Nested rollup groups
//!
//! Levels are aggregated innermost first. The innermost group reads the raw
//! field of each unwound row; every shallower group reads the result written
//! by the group below it. Only the outermost group collapses everything into
//! one bucket; intermediate groups keep one bucket per parent element, keyed
//! by the document id and the array index of every level above.

use crate::config::Operation;
use crate::flattener::FlattenedConfiguration;
use crate::pipeline::{
    Accumulator, AggregateExpr, Expr, Group, GroupKey, Literal, Project, ProjectExpr, Stage,
};
use super::layout::PipelineLayout;

/// Key of the final result in the single output document
pub const RESULT_KEY: &str = "result";

/// Key `distinct` accumulates its set into before the size projection
pub const DISTINCT_KEY: &str = "distinctValues";

const DOC_KEY: &str = "doc";

/// Result key written by `level`
pub fn result_key(flat: &FlattenedConfiguration, level: usize) -> String {
    if level == 0 {
        return RESULT_KEY.to_string();
    }
    let parent = flat
        .fields
        .get(level - 1)
        .and_then(|f| f.as_deref())
        .unwrap_or("level");
    format!("resultOf_{}", parent.replace('.', "_"))
}

fn accumulator(operation: Operation) -> Accumulator {
    match operation {
        Operation::Count | Operation::Percentage | Operation::Sum => Accumulator::Sum,
        Operation::Average => Accumulator::Avg,
        Operation::Max => Accumulator::Max,
        Operation::Min => Accumulator::Min,
        Operation::Distinct => Accumulator::AddToSet,
    }
}

fn innermost_operand(flat: &FlattenedConfiguration, layout: &PipelineLayout, level: usize) -> Expr {
    let operation = flat.operations[level];
    if matches!(operation, Operation::Count | Operation::Percentage) {
        return Expr::int(1);
    }

    let Some(path) = layout.levels.get(level).and_then(|l| l.path.clone()) else {
        return Expr::Literal(Literal::Null);
    };
    let raw = if layout.levels[level].joined {
        Expr::Coalesce(vec![
            Expr::FirstElement(Box::new(Expr::field(path.clone()))),
            Expr::field(path),
        ])
    } else {
        Expr::field(path)
    };

    if operation.is_numeric() {
        Expr::ToNumber(Box::new(raw))
    } else {
        raw
    }
}

fn group_key(layout: &PipelineLayout, level: usize, innermost: bool) -> GroupKey {
    if level == 0 {
        return GroupKey::Null;
    }

    let (doc, prefix) = if innermost {
        ("_id".to_string(), "")
    } else {
        (format!("_id.{}", DOC_KEY), "_id.")
    };

    let mut fields = vec![(DOC_KEY.to_string(), Expr::field(doc))];
    for index in layout.index_fields_above(level) {
        fields.push((index.to_string(), Expr::field(format!("{}{}", prefix, index))));
    }
    GroupKey::Fields(fields)
}

/// Group stages for every level, innermost first
pub fn build_rollups(flat: &FlattenedConfiguration, layout: &PipelineLayout) -> Vec<Stage> {
    let depth = flat.depth();
    let mut stages = Vec::new();
    let mut previous: Option<String> = None;

    for level in (0..depth).rev() {
        let operation = flat.operations[level];
        let innermost = level + 1 == depth;
        let key = result_key(flat, level);

        let operand = match (&previous, operation) {
            (_, Operation::Count | Operation::Percentage) => Expr::int(1),
            (Some(prev), _) => Expr::field(prev.clone()),
            (None, _) => innermost_operand(flat, layout, level),
        };

        let alias = if operation == Operation::Distinct {
            DISTINCT_KEY.to_string()
        } else {
            key.clone()
        };

        stages.push(Stage::Group(Group {
            key: group_key(layout, level, innermost),
            aggregates: vec![AggregateExpr {
                func: accumulator(operation),
                expr: operand,
                alias,
            }],
        }));

        if operation == Operation::Distinct {
            stages.push(Stage::Project(Project {
                fields: vec![ProjectExpr {
                    expr: Expr::Size(Box::new(Expr::field(DISTINCT_KEY))),
                    alias: key.clone(),
                }],
                retain_input: false,
            }));
        }

        previous = Some(key);
    }

    stages
}
