//! Expression and predicate types for pipeline stages

use chrono::{DateTime, Utc};

/// Value expressions, evaluated per document
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Dotted field path
    Field(String),
    Literal(Literal),
    /// Numeric conversion, null when the value is not numeric
    ToNumber(Box<Expr>),
    /// Stored reference identifiers (one or many) as an array of reference values
    ToReferences(Box<Expr>),
    /// First element of an array, null for anything else
    FirstElement(Box<Expr>),
    /// First non-null argument
    Coalesce(Vec<Expr>),
    /// Number of elements of an array
    Size(Box<Expr>),
}

impl Expr {
    pub fn field(path: impl Into<String>) -> Self {
        Expr::Field(path.into())
    }

    pub fn int(value: i64) -> Self {
        Expr::Literal(Literal::Int(value))
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl Literal {
    /// Integer literal when the number has no fractional part
    pub fn number(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Literal::Int(value as i64)
        } else {
            Literal::Float(value)
        }
    }
}

/// Comparison operators usable in predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equals,
    Greater,
    Less,
    NotEquals,
    GreaterOrEqual,
    LessOrEqual,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Equals => "$eq",
            Comparison::Greater => "$gt",
            Comparison::Less => "$lt",
            Comparison::NotEquals => "$ne",
            Comparison::GreaterOrEqual => "$gte",
            Comparison::LessOrEqual => "$lte",
        }
    }
}

/// Document predicates used by filter stages
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        path: String,
        op: Comparison,
        value: Literal,
    },
    /// Compare the stored value converted to a number; values that do not
    /// convert never match
    CompareAsNumber {
        path: String,
        op: Comparison,
        value: Literal,
    },
    /// Inclusive range
    Between {
        path: String,
        start: Literal,
        end: Literal,
    },
    Exists(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(path: impl Into<String>, op: Comparison, value: Literal) -> Self {
        Predicate::Compare {
            path: path.into(),
            op,
            value,
        }
    }

    /// AND of the given predicates, unwrapping a single one
    pub fn all(mut predicates: Vec<Predicate>) -> Self {
        if predicates.len() == 1 {
            predicates.remove(0)
        } else {
            Predicate::And(predicates)
        }
    }
}

/// Group accumulators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulator {
    Sum,
    Avg,
    Max,
    Min,
    AddToSet,
}

impl Accumulator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accumulator::Sum => "$sum",
            Accumulator::Avg => "$avg",
            Accumulator::Max => "$max",
            Accumulator::Min => "$min",
            Accumulator::AddToSet => "$addToSet",
        }
    }
}

/// An accumulator over an expression: func(expr) AS alias
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpr {
    pub func: Accumulator,
    pub expr: Expr,
    pub alias: String,
}
