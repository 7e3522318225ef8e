//! Fail-open loading of per-category listing schemas.
//!
//! A category without a usable schema still gets a form: the category
//! override fields and the flat listing fields. Missing documents, store
//! errors and malformed documents all collapse to [`LoadedSchema::absent`].
//! Whether an absent schema blocks submission is decided at submit time.

use std::sync::Arc;

use bazaar_core::{ListingSchemaDoc, LoadedSchema};
use tracing::{debug, warn};

use crate::traits::DocumentStore;

/// Loads listing schemas from the schemas collection.
#[derive(Clone)]
pub struct SchemaLoader {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl SchemaLoader {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Loads the schema for `category_id`. Never fails.
    pub async fn load(&self, category_id: &str) -> LoadedSchema {
        let category_id = category_id.trim();
        if category_id.is_empty() {
            return LoadedSchema::absent();
        }

        let doc = match self.store.get(&self.collection, category_id).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                debug!(category_id, "No listing schema for category");
                return LoadedSchema::absent();
            }
            Err(e) => {
                warn!(category_id, error = %e, "Listing schema load failed; continuing without schema");
                return LoadedSchema::absent();
            }
        };

        match ListingSchemaDoc::from_document(&doc) {
            Ok(schema) => {
                debug!(
                    category_id,
                    version = schema.version,
                    fields = schema.fields.len(),
                    "Loaded listing schema"
                );
                schema.into()
            }
            Err(e) => {
                warn!(category_id, error = %e, "Listing schema document is malformed; continuing without schema");
                LoadedSchema::absent()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bazaar_core::FieldType;
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::storage::HashMapDocumentStore;

    /// Store that fails every call and counts reads.
    #[derive(Default)]
    struct BrokenStore {
        reads: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for BrokenStore {
        async fn get(&self, _: &str, _: &str) -> anyhow::Result<Option<Value>> {
            self.reads.fetch_add(1, Ordering::Relaxed);
            anyhow::bail!("permission denied")
        }
        async fn set(&self, _: &str, _: &str, _: Value) -> anyhow::Result<()> {
            anyhow::bail!("permission denied")
        }
        async fn merge(&self, _: &str, _: &str, _: Map<String, Value>) -> anyhow::Result<()> {
            anyhow::bail!("permission denied")
        }
        async fn list(&self, _: &str) -> anyhow::Result<Vec<(String, Value)>> {
            anyhow::bail!("permission denied")
        }
        async fn delete(&self, _: &str, _: &str) -> anyhow::Result<()> {
            anyhow::bail!("permission denied")
        }
    }

    async fn loader_with(doc: Option<Value>) -> SchemaLoader {
        let store = Arc::new(HashMapDocumentStore::new());
        if let Some(doc) = doc {
            store.set("listingSchemas", "puzzle", doc).await.unwrap();
        }
        SchemaLoader::new(store, "listingSchemas")
    }

    #[tokio::test]
    async fn loads_existing_schema() {
        let loader = loader_with(Some(json!({
            "version": 3,
            "fields": [
                {"key": "pieces", "label": "Parça", "type": "number", "required": true},
                {"label": "keyless"}
            ]
        })))
        .await;

        let schema = loader.load("puzzle").await;
        assert!(schema.exists);
        assert_eq!(schema.version, 3);
        assert_eq!(schema.fields.len(), 1);
        assert_eq!(schema.fields[0].field_type, FieldType::Number);
    }

    #[tokio::test]
    async fn missing_schema_is_absent() {
        let loader = loader_with(None).await;
        assert_eq!(loader.load("puzzle").await, LoadedSchema::absent());
    }

    #[tokio::test]
    async fn malformed_schema_is_absent() {
        let loader = loader_with(Some(json!({"fields": "oops"}))).await;
        assert_eq!(loader.load("puzzle").await, LoadedSchema::absent());
    }

    #[tokio::test]
    async fn store_failure_fails_open() {
        let store = Arc::new(BrokenStore::default());
        let loader = SchemaLoader::new(store.clone(), "listingSchemas");
        assert_eq!(loader.load("konsollar").await, LoadedSchema::absent());
        assert_eq!(store.reads.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn empty_category_id_skips_the_store() {
        let store = Arc::new(BrokenStore::default());
        let loader = SchemaLoader::new(store.clone(), "listingSchemas");
        assert_eq!(loader.load("  ").await, LoadedSchema::absent());
        assert_eq!(store.reads.load(Ordering::Relaxed), 0);
    }
}
