//! Document store abstraction: named collections of JSON documents keyed by a string `_id`.

mod evaluator;
pub mod memory;
pub mod postgres;

pub(crate) use evaluator::compile_pattern;
pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PostgresStore};

use crate::error::StoreError;
use crate::format::Document;
use crate::query::{Query, SortMap};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Persistence driver consumed by models. Single-document writes are atomic; nothing else is.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create backing storage for a collection if missing.
    async fn prepare_collection(&self, collection: &str) -> Result<(), StoreError>;

    /// Documents matching every criterion, ordered by `sort` then insertion order.
    async fn find(&self, collection: &str, query: &Query, sort: &SortMap) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, collection: &str, query: &Query) -> Result<Option<Document>, StoreError> {
        Ok(self.find(collection, query, &SortMap::new()).await?.into_iter().next())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Stores `document` as given; `_id` must already be set.
    async fn insert(&self, collection: &str, document: Document) -> Result<Document, StoreError>;

    /// Shallow merge of `patch` into the stored document. Returns the post-update document.
    async fn update_by_id(&self, collection: &str, id: &str, patch: Document) -> Result<Option<Document>, StoreError>;

    /// Returns the removed document.
    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Merges `patch` into the first match, or inserts `on_insert` merged with `patch`.
    async fn upsert_one(
        &self,
        collection: &str,
        query: &Query,
        patch: Document,
        on_insert: Document,
    ) -> Result<Document, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Shared handle to the configured store.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Which backend to open.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreConfig {
    Memory,
    Postgres {
        url: String,
        max_connections: u32,
        schema: String,
    },
}

/// Owns the store handle. `connect` opens the backend once; later calls return the same handle.
pub struct StoreConnector {
    config: StoreConfig,
    handle: OnceCell<SharedStore>,
}

impl StoreConnector {
    pub fn new(config: StoreConfig) -> Self {
        StoreConnector {
            config,
            handle: OnceCell::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.handle.initialized()
    }

    pub async fn connect(&self) -> Result<SharedStore, StoreError> {
        if let Some(store) = self.handle.get() {
            tracing::debug!("document store already connected");
            return Ok(store.clone());
        }
        let store = self
            .handle
            .get_or_try_init(|| async {
                let store: SharedStore = match &self.config {
                    StoreConfig::Memory => {
                        tracing::info!("using in-memory document store");
                        Arc::new(MemoryStore::new())
                    }
                    StoreConfig::Postgres {
                        url,
                        max_connections,
                        schema,
                    } => Arc::new(PostgresStore::connect(url, *max_connections, schema).await?),
                };
                Ok::<_, StoreError>(store)
            })
            .await?;
        Ok(store.clone())
    }
}
