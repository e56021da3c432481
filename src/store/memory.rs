//! In-process document store. Collections are insertion-ordered vectors behind one async lock.

use crate::error::StoreError;
use crate::format::Document;
use crate::query::{Query, SortMap};
use crate::store::evaluator::{document_id, sort_documents, CompiledQuery};
use crate::store::DocumentStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type CollectionMap = HashMap<String, Vec<Document>>;

/// Clones share the same data.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<CollectionMap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn merge(target: &mut Document, patch: Document) {
    for (k, v) in patch {
        target.insert(k, v);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn prepare_collection(&self, collection: &str) -> Result<(), StoreError> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default();
        Ok(())
    }

    async fn find(&self, collection: &str, query: &Query, sort: &SortMap) -> Result<Vec<Document>, StoreError> {
        let compiled = CompiledQuery::compile(query)?;
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut found: Vec<Document> = docs.iter().filter(|d| compiled.matches(d)).cloned().collect();
        sort_documents(&mut found, sort);
        Ok(found)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| document_id(d) == Some(id)))
            .cloned())
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<Document, StoreError> {
        let id = document_id(&document)
            .ok_or_else(|| StoreError::Corrupt {
                collection: collection.to_string(),
                reason: "document has no string _id".into(),
            })?
            .to_string();
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| document_id(d) == Some(id.as_str())) {
            return Err(StoreError::Duplicate {
                collection: collection.to_string(),
                id,
            });
        }
        docs.push(document.clone());
        Ok(document)
    }

    async fn update_by_id(&self, collection: &str, id: &str, patch: Document) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| document_id(d) == Some(id)))
        else {
            return Ok(None);
        };
        merge(doc, patch);
        Ok(Some(doc.clone()))
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        Ok(docs
            .iter()
            .position(|d| document_id(d) == Some(id))
            .map(|pos| docs.remove(pos)))
    }

    async fn upsert_one(
        &self,
        collection: &str,
        query: &Query,
        patch: Document,
        on_insert: Document,
    ) -> Result<Document, StoreError> {
        let compiled = CompiledQuery::compile(query)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if let Some(doc) = docs.iter_mut().find(|d| compiled.matches(d)) {
            merge(doc, patch);
            return Ok(doc.clone());
        }
        let mut doc = on_insert;
        merge(&mut doc, patch);
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
