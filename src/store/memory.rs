//! In-memory store and registry
//!
//! Used by the test suite and for explaining pipelines without a database.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::trace;
use crate::pipeline::Stage;
use crate::template::{Catalog, Template};
use super::error::StoreError;
use super::eval::run_pipeline;
use super::traits::{DocumentStore, ResultStream, TemplateRegistry};

/// Collections of JSON documents evaluated in process
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    failing: RwLock<HashSet<String>>,
    latency: Option<Duration>,
    slow: RwLock<HashMap<String, Duration>>,
    executions: AtomicUsize,
    next_id: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `aggregate` call sleeps for `latency` before evaluating
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Pipelines against `collection` sleep for `latency` instead of the store-wide latency
    pub fn slow_collection(&self, collection: &str, latency: Duration) {
        self.slow.write().insert(collection.to_string(), latency);
    }

    /// Add a document, assigning an `_id` when it has none
    pub fn insert(&self, collection: &str, mut doc: Value) {
        if let Value::Object(map) = &mut doc {
            if !map.contains_key("_id") {
                let n = self.next_id.fetch_add(1, Ordering::Relaxed);
                map.insert("_id".to_string(), Value::String(format!("{collection}-{n}")));
            }
        }
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    pub fn insert_many(&self, collection: &str, docs: impl IntoIterator<Item = Value>) {
        for doc in docs {
            self.insert(collection, doc);
        }
    }

    /// Load a JSON array of documents into `collection`, returning how many were added
    pub fn load_json(&self, collection: &str, json: &str) -> Result<usize, StoreError> {
        let docs: Vec<Value> = serde_json::from_str(json)?;
        let count = docs.len();
        self.insert_many(collection, docs);
        Ok(count)
    }

    /// Make every pipeline against `collection` fail
    pub fn fail_collection(&self, collection: &str) {
        self.failing.write().insert(collection.to_string());
    }

    /// Number of `aggregate` calls received so far
    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn aggregate(&self, collection: &str, stages: &[Stage]) -> Result<ResultStream, StoreError> {
        self.executions.fetch_add(1, Ordering::SeqCst);

        let latency = self.slow.read().get(collection).copied().or(self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.read().contains(collection) {
            return Err(StoreError::Backend(format!(
                "collection '{collection}' is unavailable"
            )));
        }

        let results = {
            let collections = self.collections.read();
            let docs = collections.get(collection).cloned().unwrap_or_default();
            run_pipeline(docs, stages, |from| {
                collections.get(from).cloned().unwrap_or_default()
            })
        };
        trace!(collection, stages = stages.len(), results = results.len(), "evaluated pipeline");

        Ok(stream::iter(results.into_iter().map(Ok)).boxed())
    }
}

/// Templates served from a parsed catalog
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    catalog: RwLock<Catalog>,
    lookups: AtomicUsize,
}

impl MemoryRegistry {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Number of registry lookups served so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TemplateRegistry for MemoryRegistry {
    async fn find_template_by_collection_name(&self, name: &str) -> Result<Option<Template>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.catalog.read().get_template(name).cloned())
    }

    async fn find_template_by_id(&self, id: &str) -> Result<Option<Template>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.catalog.read().get_template_by_id(id).cloned())
    }
}
