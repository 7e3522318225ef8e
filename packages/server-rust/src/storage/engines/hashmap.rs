//! In-memory [`DocumentStore`] implementation backed by [`DashMap`].
//!
//! Provides concurrent read/write access without external locking.
//! Suitable for development, tests, and single-node deployments where all
//! listings fit in memory.

use anyhow::bail;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::traits::DocumentStore;

/// In-memory document store: one [`DashMap`] of documents per collection.
///
/// Documents must be JSON objects. Reads return clones, so callers never
/// hold a shard lock across an `.await`.
pub struct HashMapDocumentStore {
    collections: DashMap<String, DashMap<String, Value>>,
}

impl HashMapDocumentStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
        }
    }

    /// Number of documents in a collection.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |c| c.len())
    }

    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl Default for HashMapDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for HashMapDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Value>> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(None);
        };
        let doc = docs.get(id).map(|d| d.value().clone());
        Ok(doc)
    }

    async fn set(&self, collection: &str, id: &str, doc: Value) -> anyhow::Result<()> {
        if !doc.is_object() {
            bail!("document {collection}/{id} must be a JSON object");
        }
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> anyhow::Result<()> {
        let Some(docs) = self.collections.get(collection) else {
            bail!("document {collection}/{id} not found");
        };
        let Some(mut doc) = docs.get_mut(id) else {
            bail!("document {collection}/{id} not found");
        };
        let Some(target) = doc.as_object_mut() else {
            bail!("document {collection}/{id} is not an object");
        };
        target.extend(fields);
        Ok(())
    }

    async fn list(&self, collection: &str) -> anyhow::Result<Vec<(String, Value)>> {
        let mut docs: Vec<(String, Value)> = match self.collections.get(collection) {
            Some(docs) => docs
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
            None => Vec::new(),
        };
        docs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(docs)
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        if let Some(docs) = self.collections.get(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_delete_round_trip() {
        let store = HashMapDocumentStore::new();
        store
            .set("listings", "l1", json!({"title": "Catan"}))
            .await
            .unwrap();

        let fetched = store.get("listings", "l1").await.unwrap();
        assert_eq!(fetched, Some(json!({"title": "Catan"})));
        assert_eq!(store.len("listings"), 1);

        store.delete("listings", "l1").await.unwrap();
        assert!(store.get("listings", "l1").await.unwrap().is_none());
        assert!(store.is_empty("listings"));
    }

    #[tokio::test]
    async fn missing_collection_reads_as_empty() {
        let store = HashMapDocumentStore::new();
        assert!(store.get("nope", "x").await.unwrap().is_none());
        assert!(store.list("nope").await.unwrap().is_empty());
        store.delete("nope", "x").await.unwrap();
    }

    #[tokio::test]
    async fn set_rejects_non_object_documents() {
        let store = HashMapDocumentStore::new();
        assert!(store.set("listings", "l1", json!([1, 2])).await.is_err());
        assert!(store.is_empty("listings"));
    }

    #[tokio::test]
    async fn merge_overwrites_only_given_fields() {
        let store = HashMapDocumentStore::new();
        store
            .set("listings", "l1", json!({"title": "PS5", "imageUrls": []}))
            .await
            .unwrap();

        let mut fields = Map::new();
        fields.insert("imageUrls".into(), json!(["a.jpg"]));
        store.merge("listings", "l1", fields).await.unwrap();

        let doc = store.get("listings", "l1").await.unwrap().unwrap();
        assert_eq!(doc, json!({"title": "PS5", "imageUrls": ["a.jpg"]}));
    }

    #[tokio::test]
    async fn merge_into_missing_document_fails() {
        let store = HashMapDocumentStore::new();
        let err = store.merge("listings", "ghost", Map::new()).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn list_is_sorted_by_id() {
        let store = HashMapDocumentStore::new();
        for id in ["c", "a", "b"] {
            store.set("categories", id, json!({"id": id})).await.unwrap();
        }
        let ids: Vec<String> = store
            .list("categories")
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
