use crate::blob::BlobStorage;
use crate::error::BlobError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Clone, Debug)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// In-process bucket. URLs use the `memory://` scheme.
#[derive(Clone, Debug)]
pub struct MemoryBlobStorage {
    bucket: String,
    presign_expires: Duration,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl MemoryBlobStorage {
    pub fn new(bucket: &str, presign_expires: Duration) -> Self {
        MemoryBlobStorage {
            bucket: bucket.to_string(),
            presign_expires,
            objects: Arc::default(),
        }
    }

    fn url(&self, key: &str) -> String {
        format!("memory://{}/{}", self.bucket, key)
    }

    /// Stored bytes and content type.
    pub async fn get(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| (o.bytes.clone(), o.content_type.clone()))
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn ensure_bucket(&self) -> Result<(), BlobError> {
        Ok(())
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, BlobError> {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(self.url(key))
    }

    async fn signed_download_url(&self, key: &str) -> Result<String, BlobError> {
        Ok(format!("{}?expires={}", self.url(key), self.presign_expires.as_secs()))
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}
