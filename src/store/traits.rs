use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use crate::pipeline::Stage;
use crate::template::Template;
use super::error::StoreError;

/// Lazily produced result documents
pub type ResultStream = BoxStream<'static, Result<Value, StoreError>>;

/// A document database able to run aggregation pipelines
///
/// Implementations must not retry failed calls; a failure is surfaced to the
/// caller as is.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run `stages` against the physical collection `collection`.
    ///
    /// A collection that does not exist behaves as an empty one.
    async fn aggregate(&self, collection: &str, stages: &[Stage]) -> Result<ResultStream, StoreError>;
}

/// Lookup of template schemas
#[async_trait]
pub trait TemplateRegistry: Send + Sync {
    /// Template whose logical collection name is `name`
    async fn find_template_by_collection_name(&self, name: &str) -> Result<Option<Template>, StoreError>;

    /// Template by id, used to resolve table-reference targets
    async fn find_template_by_id(&self, id: &str) -> Result<Option<Template>, StoreError>;
}
