//! Per-invocation schema cache
//!
//! One `SchemaCache` lives for a single `calculate` / `calculate_multiple`
//! call. Templates change far less often than indicators are evaluated, so a
//! caller may also keep one around longer; entries are never refreshed, so a
//! template edited after it was cached is seen only by a new cache.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use crate::store::TemplateRegistry;
use crate::template::{FieldTypeMap, Template};
use super::error::IntrospectError;
use super::resolve::{collect_references, resolve_field_types};

/// A template together with its resolved field kinds
#[derive(Debug)]
pub struct ResolvedSchema {
    pub template: Template,
    pub field_types: FieldTypeMap,
}

/// Resolved schemas keyed by logical collection name
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<String, Arc<ResolvedSchema>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, collection: &str) -> Option<Arc<ResolvedSchema>> {
        self.entries.read().get(collection).cloned()
    }

    /// Store a schema; an entry inserted concurrently for the same collection wins
    pub fn insert(&self, collection: &str, schema: ResolvedSchema) -> Arc<ResolvedSchema> {
        self.entries
            .write()
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(schema))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Resolve the schema of a logical collection, going to the registry on a cache miss
///
/// Referenced templates that cannot be found leave their table fields
/// dangling rather than failing the whole lookup.
pub async fn load_schema<R>(
    registry: &R,
    cache: &SchemaCache,
    collection: &str,
) -> Result<Arc<ResolvedSchema>, IntrospectError>
where
    R: TemplateRegistry + ?Sized,
{
    if let Some(schema) = cache.get(collection) {
        return Ok(schema);
    }

    let template = registry
        .find_template_by_collection_name(collection)
        .await?
        .ok_or_else(|| IntrospectError::TemplateNotFound(collection.to_string()))?;

    let mut targets = HashMap::new();
    for id in collect_references(&template.sections) {
        if let Some(target) = registry.find_template_by_id(&id).await? {
            targets.insert(id, target.as_ref_target());
        }
    }

    let field_types = resolve_field_types(&template.sections, &targets);
    debug!(collection, fields = field_types.len(), "resolved template schema");

    Ok(cache.insert(collection, ResolvedSchema { template, field_types }))
}
