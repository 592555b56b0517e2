//! In-memory evaluation of pipeline stages over JSON documents
//!
//! Follows document-database semantics: dotted paths fan out over arrays,
//! predicates match when any reached value matches, comparisons only hold
//! between values of the same type.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};
use crate::pipeline::{
    Accumulator, Comparison, Expr, Filter, Group, GroupKey, Join, Literal,
    Predicate, Project, Stage, Unwind,
};
use crate::validator::parse_timestamp;

/// Run `stages` over `docs`. `lookup` returns the documents of a joined collection.
pub fn run_pipeline<F>(docs: Vec<Value>, stages: &[Stage], lookup: F) -> Vec<Value>
where
    F: Fn(&str) -> Vec<Value>,
{
    let mut current = docs;
    for stage in stages {
        current = match stage {
            Stage::Filter(filter) => exec_filter(current, filter),
            Stage::Unwind(unwind) => exec_unwind(current, unwind),
            Stage::Join(join) => {
                let foreign = lookup(&join.from);
                exec_join(current, join, &foreign)
            }
            Stage::Group(group) => exec_group(current, group),
            Stage::Project(project) => exec_project(current, project),
        };
    }
    current
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Value at a dotted path, `Null` when missing
///
/// An array met before the last segment yields the array of values found in
/// its elements.
pub(crate) fn resolve_path(doc: &Value, path: &str) -> Value {
    let segments: Vec<&str> = path.split('.').collect();
    resolve_segments(doc, &segments).unwrap_or(Value::Null)
}

fn resolve_segments(current: &Value, segments: &[&str]) -> Option<Value> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(current.clone());
    };
    match current {
        Value::Object(map) => resolve_segments(map.get(*head)?, rest),
        Value::Array(items) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| resolve_segments(item, segments))
                .collect(),
        )),
        _ => None,
    }
}

/// Every value a predicate on `path` is tested against
fn candidates<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    collect_candidates(doc, &segments, &mut out);
    out
}

fn collect_candidates<'a>(current: &'a Value, segments: &[&str], out: &mut Vec<&'a Value>) {
    match segments.split_first() {
        None => {
            if let Value::Array(items) = current {
                out.extend(items.iter());
            }
            out.push(current);
        }
        Some((head, rest)) => match current {
            Value::Object(map) => {
                if let Some(next) = map.get(*head) {
                    collect_candidates(next, rest, out);
                }
            }
            Value::Array(items) => {
                for item in items {
                    collect_candidates(item, segments, out);
                }
            }
            _ => {}
        },
    }
}

/// Set a dotted path, creating intermediate objects
pub(crate) fn set_field(doc: &mut Value, path: &str, value: Value) {
    let mut current = doc;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        let entry = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = entry;
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

fn number_to_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn literal_to_value(lit: &Literal) -> Value {
    match lit {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::from(*i),
        Literal::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Literal::String(s) => Value::String(s.clone()),
        Literal::Timestamp(ts) => Value::String(ts.to_rfc3339()),
    }
}

fn to_number(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(number_to_value)
            .unwrap_or(Value::Null),
        Value::Bool(b) => Value::from(if *b { 1 } else { 0 }),
        _ => Value::Null,
    }
}

/// Stored references are plain id strings or `{"$oid": ..}` objects
fn to_reference(value: Value) -> Value {
    match value {
        Value::Object(ref map) => match map.get("$oid") {
            Some(Value::String(id)) => Value::String(id.clone()),
            _ => value,
        },
        other => other,
    }
}

fn stored_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s, false).ok(),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms)),
        Value::Object(map) => map.get("$date").and_then(stored_timestamp),
        _ => None,
    }
}

/// Compare a stored value with a literal; `None` when the types do not compare
fn compare_literal(stored: &Value, lit: &Literal) -> Option<Ordering> {
    match (stored, lit) {
        (Value::Null, Literal::Null) => Some(Ordering::Equal),
        (Value::Number(n), Literal::Int(i)) => n.as_f64()?.partial_cmp(&(*i as f64)),
        (Value::Number(n), Literal::Float(f)) => n.as_f64()?.partial_cmp(f),
        (Value::String(s), Literal::String(l)) => Some(s.as_str().cmp(l.as_str())),
        (Value::Bool(b), Literal::Bool(l)) => Some(b.cmp(l)),
        (_, Literal::Timestamp(ts)) => stored_timestamp(stored).map(|t| t.cmp(ts)),
        _ => None,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

/// Total order across types (null < numbers < strings < objects < arrays < booleans)
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

// ---------------------------------------------------------------------------
// Predicates and expressions
// ---------------------------------------------------------------------------

fn comparison_holds(op: Comparison, ord: Ordering) -> bool {
    match op {
        Comparison::Equals => ord == Ordering::Equal,
        Comparison::NotEquals => ord != Ordering::Equal,
        Comparison::Greater => ord == Ordering::Greater,
        Comparison::Less => ord == Ordering::Less,
        Comparison::GreaterOrEqual => ord != Ordering::Less,
        Comparison::LessOrEqual => ord != Ordering::Greater,
    }
}

pub(crate) fn matches(doc: &Value, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Compare { path, op, value } => {
            let found = candidates(doc, path);
            match op {
                // Holds when no reached value equals, including a missing field
                Comparison::NotEquals => !found
                    .iter()
                    .any(|c| compare_literal(c, value) == Some(Ordering::Equal)),
                _ => found.iter().any(|c| {
                    compare_literal(c, value)
                        .map(|ord| comparison_holds(*op, ord))
                        .unwrap_or(false)
                }),
            }
        }
        Predicate::CompareAsNumber { path, op, value } => candidates(doc, path).iter().any(|c| {
            compare_literal(&to_number(c), value)
                .map(|ord| comparison_holds(*op, ord))
                .unwrap_or(false)
        }),
        Predicate::Between { path, start, end } => candidates(doc, path).iter().any(|c| {
            matches!(compare_literal(c, start), Some(Ordering::Greater | Ordering::Equal))
                && matches!(compare_literal(c, end), Some(Ordering::Less | Ordering::Equal))
        }),
        Predicate::Exists(path) => !candidates(doc, path).is_empty(),
        Predicate::And(predicates) => predicates.iter().all(|p| matches(doc, p)),
        Predicate::Or(predicates) => predicates.iter().any(|p| matches(doc, p)),
    }
}

pub(crate) fn eval_expr(doc: &Value, expr: &Expr) -> Value {
    match expr {
        Expr::Field(path) => resolve_path(doc, path),
        Expr::Literal(lit) => literal_to_value(lit),
        Expr::ToNumber(inner) => to_number(&eval_expr(doc, inner)),
        Expr::ToReferences(inner) => match eval_expr(doc, inner) {
            Value::Null => Value::Array(Vec::new()),
            Value::Array(items) => Value::Array(items.into_iter().map(to_reference).collect()),
            other => Value::Array(vec![to_reference(other)]),
        },
        Expr::FirstElement(inner) => match eval_expr(doc, inner) {
            Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
            _ => Value::Null,
        },
        Expr::Coalesce(args) => args
            .iter()
            .map(|arg| eval_expr(doc, arg))
            .find(|v| !v.is_null())
            .unwrap_or(Value::Null),
        Expr::Size(inner) => match eval_expr(doc, inner) {
            Value::Array(items) => Value::from(items.len() as u64),
            _ => Value::Null,
        },
    }
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

fn exec_filter(docs: Vec<Value>, filter: &Filter) -> Vec<Value> {
    docs.into_iter()
        .filter(|doc| matches(doc, &filter.predicate))
        .collect()
}

fn exec_unwind(docs: Vec<Value>, unwind: &Unwind) -> Vec<Value> {
    let mut out = Vec::new();
    for doc in docs {
        match resolve_path(&doc, &unwind.path) {
            Value::Array(items) => {
                for (idx, item) in items.into_iter().enumerate() {
                    let mut next = doc.clone();
                    set_field(&mut next, &unwind.path, item);
                    if let Some(field) = &unwind.index_field {
                        set_field(&mut next, field, Value::from(idx as u64));
                    }
                    out.push(next);
                }
            }
            Value::Null => {}
            // A single value unwinds to itself
            _ => {
                let mut next = doc;
                if let Some(field) = &unwind.index_field {
                    set_field(&mut next, field, Value::Null);
                }
                out.push(next);
            }
        }
    }
    out
}

fn exec_join(docs: Vec<Value>, join: &Join, foreign: &[Value]) -> Vec<Value> {
    docs.into_iter()
        .map(|mut doc| {
            let keys = match resolve_path(&doc, &join.local_field) {
                Value::Array(items) => items,
                Value::Null => Vec::new(),
                other => vec![other],
            };
            let joined: Vec<Value> = foreign
                .iter()
                .filter(|candidate| {
                    let foreign_key = resolve_path(candidate, &join.foreign_field);
                    !foreign_key.is_null()
                        && keys
                            .iter()
                            .any(|k| compare_values(k, &foreign_key) == Ordering::Equal)
                })
                .cloned()
                .collect();
            set_field(&mut doc, &join.alias, Value::Array(joined));
            doc
        })
        .collect()
}

/// Dedup key for `$addToSet`: integral floats collapse onto their integer form
fn set_key(value: &Value) -> String {
    match value {
        Value::Number(n) if !(n.is_i64() || n.is_u64()) => match n.as_f64() {
            Some(f) => number_to_value(f).to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

fn evaluate_accumulator(func: Accumulator, expr: &Expr, docs: &[&Value]) -> Value {
    let values = docs.iter().map(|doc| eval_expr(doc, expr));
    match func {
        Accumulator::Sum => {
            let mut total = 0.0;
            let mut integral = true;
            for value in values {
                if let Value::Number(n) = &value {
                    if let Some(x) = n.as_f64() {
                        total += x;
                        integral &= n.is_i64() || n.is_u64();
                    }
                }
            }
            if integral {
                number_to_value(total)
            } else {
                Number::from_f64(total).map(Value::Number).unwrap_or(Value::Null)
            }
        }
        Accumulator::Avg => {
            let numbers: Vec<f64> = values.filter_map(|v| v.as_f64()).collect();
            if numbers.is_empty() {
                return Value::Null;
            }
            let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
            Number::from_f64(mean).map(Value::Number).unwrap_or(Value::Null)
        }
        Accumulator::Max => values
            .filter(|v| !v.is_null())
            .max_by(compare_values)
            .unwrap_or(Value::Null),
        Accumulator::Min => values
            .filter(|v| !v.is_null())
            .min_by(compare_values)
            .unwrap_or(Value::Null),
        Accumulator::AddToSet => {
            let mut seen = HashSet::new();
            Value::Array(
                values
                    .filter(|v| !v.is_null() && seen.insert(set_key(v)))
                    .collect(),
            )
        }
    }
}

fn group_key(doc: &Value, key: &GroupKey) -> Value {
    match key {
        GroupKey::Null => Value::Null,
        GroupKey::Fields(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, expr)| (name.clone(), eval_expr(doc, expr)))
                .collect(),
        ),
    }
}

/// Bucket documents by key, in first-seen order, then reduce each bucket
fn exec_group(docs: Vec<Value>, group: &Group) -> Vec<Value> {
    let mut buckets: Vec<(Value, Vec<&Value>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for doc in &docs {
        let key = group_key(doc, &group.key);
        let position = *positions.entry(key.to_string()).or_insert_with(|| {
            buckets.push((key, Vec::new()));
            buckets.len() - 1
        });
        buckets[position].1.push(doc);
    }

    buckets
        .into_iter()
        .map(|(key, members)| {
            let mut out = Map::new();
            out.insert("_id".to_string(), key);
            for agg in &group.aggregates {
                out.insert(
                    agg.alias.clone(),
                    evaluate_accumulator(agg.func, &agg.expr, &members),
                );
            }
            Value::Object(out)
        })
        .collect()
}

fn exec_project(docs: Vec<Value>, project: &Project) -> Vec<Value> {
    docs.into_iter()
        .map(|doc| {
            let computed: Vec<(String, Value)> = project
                .fields
                .iter()
                .map(|f| (f.alias.clone(), eval_expr(&doc, &f.expr)))
                .collect();

            let mut out = if project.retain_input {
                doc
            } else {
                let mut map = Map::new();
                if let Some(id) = doc.get("_id") {
                    map.insert("_id".to_string(), id.clone());
                }
                Value::Object(map)
            };
            for (alias, value) in computed {
                set_field(&mut out, &alias, value);
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::pipeline::{AggregateExpr, ProjectExpr};

    fn no_lookup(_: &str) -> Vec<Value> {
        Vec::new()
    }

    #[test]
    fn test_resolve_path_fans_out_over_arrays() {
        let doc = json!({"M": {"Events": [{"T": "a"}, {"T": "b"}, {}]}});
        assert_eq!(resolve_path(&doc, "M.Events.T"), json!(["a", "b"]));
        assert_eq!(resolve_path(&doc, "M.Missing"), Value::Null);
    }

    #[test]
    fn test_unwind_records_index_and_drops_empty() {
        let docs = vec![
            json!({"_id": 1, "M": {"E": ["x", "y"]}}),
            json!({"_id": 2, "M": {"E": []}}),
            json!({"_id": 3, "M": {}}),
        ];
        let stage = Stage::Unwind(Unwind {
            path: "M.E".into(),
            index_field: Some("_i0".into()),
        });
        let out = run_pipeline(docs, &[stage], no_lookup);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1]["M"]["E"], json!("y"));
        assert_eq!(out[1]["_i0"], json!(1));
    }

    #[test]
    fn test_compare_is_type_strict() {
        let num = json!({"v": 5});
        let text = json!({"v": "5"});
        let eq_num = Predicate::compare("v", Comparison::Equals, Literal::Int(5));
        let eq_text = Predicate::compare("v", Comparison::Equals, Literal::String("5".into()));

        assert!(matches(&num, &eq_num));
        assert!(!matches(&num, &eq_text));
        assert!(matches(&text, &eq_text));
        assert!(!matches(&text, &eq_num));
    }

    #[test]
    fn test_not_equals_over_arrays_and_missing() {
        let ne = Predicate::compare("tags", Comparison::NotEquals, Literal::String("a".into()));
        assert!(!matches(&json!({"tags": ["a", "b"]}), &ne));
        assert!(matches(&json!({"tags": ["b"]}), &ne));
        assert!(matches(&json!({}), &ne));
    }

    #[test]
    fn test_between_parses_stored_dates() {
        let start = parse_timestamp("2024-01-01", false).unwrap();
        let end = parse_timestamp("2024-01-31", true).unwrap();
        let between = Predicate::Between {
            path: "G.When".into(),
            start: Literal::Timestamp(start),
            end: Literal::Timestamp(end),
        };
        assert!(matches(&json!({"G": {"When": "2024-01-31"}}), &between));
        assert!(matches(&json!({"G": {"When": "2024-01-15T10:00:00Z"}}), &between));
        assert!(!matches(&json!({"G": {"When": "2024-02-01"}}), &between));
        assert!(!matches(&json!({"G": {"When": "soon"}}), &between));
    }

    #[test]
    fn test_group_accumulators() {
        let docs = vec![json!({"v": 2}), json!({"v": 4.5}), json!({"v": "x"}), json!({})];
        let group = Stage::Group(Group {
            key: GroupKey::Null,
            aggregates: vec![
                AggregateExpr { func: Accumulator::Sum, expr: Expr::int(1), alias: "n".into() },
                AggregateExpr { func: Accumulator::Sum, expr: Expr::field("v"), alias: "sum".into() },
                AggregateExpr { func: Accumulator::Avg, expr: Expr::field("v"), alias: "avg".into() },
                AggregateExpr { func: Accumulator::Max, expr: Expr::ToNumber(Box::new(Expr::field("v"))), alias: "max".into() },
                AggregateExpr { func: Accumulator::AddToSet, expr: Expr::field("v"), alias: "set".into() },
            ],
        });
        let out = run_pipeline(docs, &[group], no_lookup);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["n"], json!(4));
        assert_eq!(out[0]["sum"], json!(6.5));
        assert_eq!(out[0]["avg"], json!(3.25));
        assert_eq!(out[0]["max"], json!(4.5));
        assert_eq!(out[0]["set"].as_array().map(|a| a.len()), Some(3));
    }

    #[test]
    fn test_add_to_set_treats_integral_floats_as_integers() {
        let docs = vec![json!({"v": 1}), json!({"v": 1.0}), json!({"v": 1.5}), json!({"v": "1"})];
        let group = Stage::Group(Group {
            key: GroupKey::Null,
            aggregates: vec![AggregateExpr {
                func: Accumulator::AddToSet,
                expr: Expr::field("v"),
                alias: "set".into(),
            }],
        });
        let out = run_pipeline(docs, &[group], no_lookup);
        assert_eq!(out[0]["set"], json!([1, 1.5, "1"]));
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let docs = vec![json!({"k": "b", "v": 1}), json!({"k": "a", "v": 2}), json!({"k": "b", "v": 3})];
        let group = Stage::Group(Group {
            key: GroupKey::Fields(vec![("k".into(), Expr::field("k"))]),
            aggregates: vec![AggregateExpr {
                func: Accumulator::Sum,
                expr: Expr::field("v"),
                alias: "total".into(),
            }],
        });
        let out = run_pipeline(docs, &[group], no_lookup);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["_id"], json!({"k": "b"}));
        assert_eq!(out[0]["total"], json!(4));
        assert_eq!(out[1]["total"], json!(2));
    }

    #[test]
    fn test_avg_of_nothing_is_null() {
        let group = Stage::Group(Group {
            key: GroupKey::Null,
            aggregates: vec![AggregateExpr {
                func: Accumulator::Avg,
                expr: Expr::field("v"),
                alias: "avg".into(),
            }],
        });
        let out = run_pipeline(vec![json!({"v": "n/a"})], &[group], no_lookup);
        assert_eq!(out[0]["avg"], Value::Null);
    }

    #[test]
    fn test_join_matches_reference_arrays() {
        let docs = vec![json!({"_id": "s1", "refs": ["p1", {"$oid": "p2"}]})];
        let foreign = vec![
            json!({"_id": "p1", "Name": "one"}),
            json!({"_id": "p2", "Name": "two"}),
            json!({"_id": "p3", "Name": "three"}),
        ];
        let stages = vec![
            Stage::Project(Project {
                fields: vec![ProjectExpr {
                    expr: Expr::ToReferences(Box::new(Expr::field("refs"))),
                    alias: "ids".into(),
                }],
                retain_input: true,
            }),
            Stage::Join(Join {
                from: "projects".into(),
                local_field: "ids".into(),
                foreign_field: "_id".into(),
                alias: "joined".into(),
            }),
        ];
        let out = run_pipeline(docs, &stages, |name| {
            if name == "projects" { foreign.clone() } else { Vec::new() }
        });
        let joined = out[0]["joined"].as_array().unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[1]["Name"], json!("two"));
    }

    #[test]
    fn test_set_field_creates_objects() {
        let mut doc = json!({"a": 1});
        set_field(&mut doc, "b.c", json!(2));
        assert_eq!(doc, json!({"a": 1, "b": {"c": 2}}));
    }
}
