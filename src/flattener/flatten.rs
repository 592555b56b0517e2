use crate::config::{Condition, MetricConfiguration, Operation};

/// Per-level view of a metric configuration
///
/// The three sequences always have the same length, the configuration depth.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedConfiguration {
    pub fields: Vec<Option<String>>,
    pub operations: Vec<Operation>,
    pub condition_sets: Vec<Vec<Condition>>,
}

/// One rollup level borrowed from a [`FlattenedConfiguration`]
#[derive(Debug, Clone, Copy)]
pub struct Level<'a> {
    pub index: usize,
    pub field: Option<&'a str>,
    pub operation: Operation,
    pub conditions: &'a [Condition],
}

impl FlattenedConfiguration {
    pub fn depth(&self) -> usize {
        self.operations.len()
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.depth()
    }

    pub fn level(&self, index: usize) -> Option<Level<'_>> {
        Some(Level {
            index,
            field: self.fields.get(index)?.as_deref(),
            operation: *self.operations.get(index)?,
            conditions: self.condition_sets.get(index)?,
        })
    }

    pub fn levels(&self) -> impl Iterator<Item = Level<'_>> {
        (0..self.depth()).filter_map(move |i| self.level(i))
    }
}

/// Flatten a configuration chain, outermost level first
pub fn flatten(config: &MetricConfiguration) -> FlattenedConfiguration {
    let mut flat = FlattenedConfiguration {
        fields: Vec::new(),
        operations: Vec::new(),
        condition_sets: Vec::new(),
    };

    let mut current = Some(config);
    while let Some(level) = current {
        flat.fields.push(level.field_path.clone());
        flat.operations.push(level.operation);
        flat.condition_sets.push(level.conditions.clone());
        current = level.sub_configuration.as_deref();
    }

    flat
}
