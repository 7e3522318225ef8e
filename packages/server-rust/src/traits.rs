use async_trait::async_trait;
use serde_json::{Map, Value};

/// Pluggable document database backend.
///
/// Documents are JSON objects addressed by `(collection, id)`. There are no
/// multi-document transactions: every call is an independent write.
/// Implementations: in-memory (`HashMapDocumentStore`), hosted document
/// databases (future).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a single document; `None` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Value>>;

    /// Create or fully replace a document.
    async fn set(&self, collection: &str, id: &str, doc: Value) -> anyhow::Result<()>;

    /// Shallow-merge `fields` into an existing document.
    ///
    /// Fails when the document does not exist.
    async fn merge(&self, collection: &str, id: &str, fields: Map<String, Value>)
        -> anyhow::Result<()>;

    /// All documents of a collection as `(id, document)` pairs.
    async fn list(&self, collection: &str) -> anyhow::Result<Vec<(String, Value)>>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()>;
}
