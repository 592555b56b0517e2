//! MongoDB pipeline emission

use serde_json::{json, Map, Number, Value};
use crate::pipeline::{
    AggregateExpr, Expr, Filter, Group, GroupKey, Join, Literal, Predicate, Project,
    Stage, Unwind,
};
use super::error::EmitError;

/// Render stages as the JSON array accepted by `aggregate`
pub fn emit_pipeline(stages: &[Stage]) -> Result<Value, EmitError> {
    stages
        .iter()
        .map(emit_stage)
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

pub fn emit_stage(stage: &Stage) -> Result<Value, EmitError> {
    match stage {
        Stage::Filter(filter) => emit_filter(filter),
        Stage::Unwind(unwind) => Ok(emit_unwind(unwind)),
        Stage::Join(join) => Ok(emit_join(join)),
        Stage::Group(group) => emit_group(group),
        Stage::Project(project) => emit_project(project),
    }
}

fn field_ref(path: &str) -> Value {
    Value::String(format!("${}", path))
}

fn emit_filter(filter: &Filter) -> Result<Value, EmitError> {
    Ok(json!({ "$match": emit_predicate(&filter.predicate)? }))
}

fn emit_unwind(unwind: &Unwind) -> Value {
    match &unwind.index_field {
        Some(index) => json!({
            "$unwind": {
                "path": field_ref(&unwind.path),
                "includeArrayIndex": index,
                "preserveNullAndEmptyArrays": false,
            }
        }),
        None => json!({ "$unwind": field_ref(&unwind.path) }),
    }
}

fn emit_join(join: &Join) -> Value {
    json!({
        "$lookup": {
            "from": join.from,
            "localField": join.local_field,
            "foreignField": join.foreign_field,
            "as": join.alias,
        }
    })
}

fn emit_group(group: &Group) -> Result<Value, EmitError> {
    let mut body = Map::new();
    let key = match &group.key {
        GroupKey::Null => Value::Null,
        GroupKey::Fields(fields) => {
            let mut key = Map::new();
            for (name, expr) in fields {
                key.insert(name.clone(), emit_expr(expr)?);
            }
            Value::Object(key)
        }
    };
    body.insert("_id".to_string(), key);

    for agg in &group.aggregates {
        body.insert(agg.alias.clone(), emit_accumulator(agg)?);
    }
    Ok(json!({ "$group": body }))
}

fn emit_accumulator(agg: &AggregateExpr) -> Result<Value, EmitError> {
    let mut acc = Map::new();
    acc.insert(agg.func.as_str().to_string(), emit_expr(&agg.expr)?);
    Ok(Value::Object(acc))
}

fn emit_project(project: &Project) -> Result<Value, EmitError> {
    let mut fields = Map::new();
    for field in &project.fields {
        fields.insert(field.alias.clone(), emit_expr(&field.expr)?);
    }
    let op = if project.retain_input { "$addFields" } else { "$project" };
    let mut stage = Map::new();
    stage.insert(op.to_string(), Value::Object(fields));
    Ok(Value::Object(stage))
}

fn emit_literal(lit: &Literal) -> Result<Value, EmitError> {
    Ok(match lit {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::from(*i),
        Literal::Float(f) => Number::from_f64(*f)
            .map(Value::Number)
            .ok_or(EmitError::NonFiniteNumber(*f))?,
        Literal::String(s) => Value::String(s.clone()),
        Literal::Timestamp(ts) => json!({ "$date": ts.to_rfc3339() }),
    })
}

fn emit_predicate(predicate: &Predicate) -> Result<Value, EmitError> {
    Ok(match predicate {
        Predicate::Compare { path, op, value } => {
            let mut cond = Map::new();
            cond.insert(op.as_str().to_string(), emit_literal(value)?);
            let mut out = Map::new();
            out.insert(path.clone(), Value::Object(cond));
            Value::Object(out)
        }
        Predicate::CompareAsNumber { path, op, value } => {
            let converted = emit_expr(&Expr::ToNumber(Box::new(Expr::field(path.clone()))))?;
            let mut cond = Map::new();
            cond.insert(
                op.as_str().to_string(),
                json!([converted, emit_literal(value)?]),
            );
            json!({ "$expr": Value::Object(cond) })
        }
        Predicate::Between { path, start, end } => {
            let mut out = Map::new();
            out.insert(
                path.clone(),
                json!({
                    "$gte": emit_literal(start)?,
                    "$lte": emit_literal(end)?,
                }),
            );
            Value::Object(out)
        }
        Predicate::Exists(path) => {
            let mut out = Map::new();
            out.insert(path.clone(), json!({ "$exists": true }));
            Value::Object(out)
        }
        Predicate::And(parts) => json!({ "$and": emit_predicates(parts)? }),
        Predicate::Or(parts) => json!({ "$or": emit_predicates(parts)? }),
    })
}

fn emit_predicates(parts: &[Predicate]) -> Result<Vec<Value>, EmitError> {
    parts.iter().map(emit_predicate).collect()
}

fn emit_expr(expr: &Expr) -> Result<Value, EmitError> {
    Ok(match expr {
        Expr::Field(path) => field_ref(path),
        // Strings starting with `$` would read as field paths
        Expr::Literal(Literal::String(s)) if s.starts_with('$') => json!({ "$literal": s }),
        Expr::Literal(lit) => emit_literal(lit)?,
        Expr::ToNumber(inner) => json!({
            "$convert": {
                "input": emit_expr(inner)?,
                "to": "double",
                "onError": null,
                "onNull": null,
            }
        }),
        Expr::ToReferences(inner) => {
            let input = emit_expr(inner)?;
            json!({
                "$map": {
                    "input": {
                        "$cond": [
                            { "$isArray": input },
                            input,
                            { "$cond": [{ "$eq": [{ "$ifNull": [input, null] }, null] }, [], [input]] },
                        ]
                    },
                    "as": "ref",
                    "in": {
                        "$convert": {
                            "input": "$$ref",
                            "to": "objectId",
                            "onError": "$$ref",
                            "onNull": null,
                        }
                    },
                }
            })
        }
        Expr::FirstElement(inner) => {
            let input = emit_expr(inner)?;
            json!({ "$cond": [{ "$isArray": input }, { "$arrayElemAt": [input, 0] }, null] })
        }
        Expr::Coalesce(args) => {
            let args = args.iter().map(emit_expr).collect::<Result<Vec<_>, _>>()?;
            json!({ "$ifNull": args })
        }
        Expr::Size(inner) => json!({ "$size": { "$ifNull": [emit_expr(inner)?, []] } }),
    })
}
