//! Pipeline stage types

use super::expr::{AggregateExpr, Expr, Predicate};

/// One stage of an aggregation pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keep documents matching a predicate
    Filter(Filter),
    /// One output document per element of an array field
    Unwind(Unwind),
    /// Attach matching documents of another collection
    Join(Join),
    /// Group documents and accumulate values
    Group(Group),
    /// Compute fields
    Project(Project),
}

impl Stage {
    pub fn filter(predicate: Predicate) -> Self {
        Stage::Filter(Filter { predicate })
    }

    pub fn unwind(path: impl Into<String>) -> Self {
        Stage::Unwind(Unwind {
            path: path.into(),
            index_field: None,
        })
    }

    /// Short name for logs and assertions
    pub fn kind(&self) -> &'static str {
        match self {
            Stage::Filter(_) => "filter",
            Stage::Unwind(_) => "unwind",
            Stage::Join(_) => "join",
            Stage::Group(_) => "group",
            Stage::Project(_) => "project",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub predicate: Predicate,
}

/// Flatten an array field
///
/// Documents whose array is missing or empty are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Unwind {
    /// Dotted path of the array
    pub path: String,
    /// Top-level field receiving the element's array index
    pub index_field: Option<String>,
}

/// Left join against another collection
///
/// Every input document gets `alias` set to the array of foreign documents
/// whose `foreign_field` equals (or is contained in) the local value.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Physical collection to join
    pub from: String,
    pub local_field: String,
    pub foreign_field: String,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: GroupKey,
    pub aggregates: Vec<AggregateExpr>,
}

/// Grouping key: everything in one bucket, or a compound key
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    Null,
    Fields(Vec<(String, Expr)>),
}

/// Compute named expressions
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub fields: Vec<ProjectExpr>,
    /// Keep the input's other fields (add fields) instead of replacing the document
    pub retain_input: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectExpr {
    pub expr: Expr,
    pub alias: String,
}
