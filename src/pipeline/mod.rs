//! Abstract pipeline types (noun module)
//!
//! An ordered list of stages over a document collection. Built in memory per
//! call, rendered by the emitter or evaluated by a store, then discarded.

mod stage;
mod expr;

pub use stage::{Stage, Filter, Unwind, Join, Group, GroupKey, Project, ProjectExpr};
pub use expr::{Expr, Predicate, Comparison, Literal, Accumulator, AggregateExpr};
