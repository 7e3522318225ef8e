//! Bulk-loading documents from a JSON seed file.
//!
//! Seed format: `{ "<collection>": { "<id>": { ...document... } } }`.

use std::path::Path;

use anyhow::Context;
use serde_json::Value;
use tracing::info;

use crate::traits::DocumentStore;

/// Writes every document of `seed` into `store`; returns the document count.
///
/// # Errors
///
/// Returns an error if the seed is not a map of collections to maps of
/// documents, or if a write fails.
pub async fn apply_seed(store: &dyn DocumentStore, seed: Value) -> anyhow::Result<usize> {
    let Value::Object(collections) = seed else {
        anyhow::bail!("seed must be an object keyed by collection name");
    };

    let mut written = 0;
    for (collection, docs) in collections {
        let Value::Object(docs) = docs else {
            anyhow::bail!("seed collection {collection} must be an object keyed by document id");
        };
        for (id, doc) in docs {
            store
                .set(&collection, &id, doc)
                .await
                .with_context(|| format!("seeding {collection}/{id}"))?;
            written += 1;
        }
        info!(collection = %collection, "Seeded collection");
    }
    Ok(written)
}

/// Reads a seed file and applies it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if
/// [`apply_seed`] fails.
pub async fn load_seed_file(store: &dyn DocumentStore, path: &Path) -> anyhow::Result<usize> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let seed: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing seed file {}", path.display()))?;
    apply_seed(store, seed).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::HashMapDocumentStore;
    use serde_json::json;

    #[tokio::test]
    async fn seed_writes_every_document() {
        let store = HashMapDocumentStore::new();
        let count = apply_seed(
            &store,
            json!({
                "categories": {
                    "konsollar": {"name": "Konsollar", "order": 1},
                    "kutu-oyunlari": {"name": "Kutu Oyunları", "order": 2}
                },
                "listingSchemas": {
                    "konsollar": {"version": 1, "fields": []}
                }
            }),
        )
        .await
        .unwrap();

        assert_eq!(count, 3);
        assert_eq!(store.len("categories"), 2);
        assert!(store.get("listingSchemas", "konsollar").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn malformed_seed_is_rejected() {
        let store = HashMapDocumentStore::new();
        assert!(apply_seed(&store, json!([])).await.is_err());
        assert!(apply_seed(&store, json!({"categories": [1]})).await.is_err());
    }

    #[tokio::test]
    async fn missing_seed_file_reports_path() {
        let store = HashMapDocumentStore::new();
        let err = load_seed_file(&store, Path::new("/definitely/not/here.json"))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }
}
