//! Blob storage for uploaded media, addressed by content hash.

pub mod memory;
pub mod s3;

pub use memory::MemoryBlobStorage;
pub use s3::S3BlobStorage;

use crate::error::BlobError;
use async_trait::async_trait;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Create the bucket if missing.
    async fn ensure_bucket(&self) -> Result<(), BlobError>;

    /// Store `bytes` under `key`, returning the object URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, BlobError>;

    /// Time-limited download URL. Does not check that the object exists.
    async fn signed_download_url(&self, key: &str) -> Result<String, BlobError>;

    /// Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), BlobError>;
}

pub type SharedBlobs = Arc<dyn BlobStorage>;

#[derive(Clone, Debug, PartialEq)]
pub enum BlobConfig {
    Memory {
        bucket: String,
        presign_expires: Duration,
    },
    S3 {
        bucket: String,
        region: String,
        endpoint: Option<String>,
        presign_expires: Duration,
    },
}

pub async fn open(config: &BlobConfig) -> Result<SharedBlobs, BlobError> {
    Ok(match config {
        BlobConfig::Memory {
            bucket,
            presign_expires,
        } => Arc::new(MemoryBlobStorage::new(bucket, *presign_expires)),
        BlobConfig::S3 {
            bucket,
            region,
            endpoint,
            presign_expires,
        } => Arc::new(S3BlobStorage::connect(bucket, region, endpoint.as_deref(), *presign_expires).await),
    })
}

/// `<sha256 hex>.<extension>`: identical bytes always map to the same key.
pub fn file_key(bytes: &[u8], extension: &str) -> String {
    format!("{}.{}", hex::encode(Sha256::digest(bytes)), extension)
}

/// Subtype of a MIME type (`image/png` -> `png`), or `jpg` when there is none.
pub fn extension_for_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .and_then(|mime| mime.split('/').nth(1))
        .map(str::trim)
        .filter(|sub| !sub.is_empty())
        .unwrap_or("jpg")
        .to_string()
}

/// Extension of an uploaded file name: the text after the last `.`, or the whole name.
pub fn extension_for_file_name(name: &str) -> String {
    name.rsplit('.').next().unwrap_or_default().to_string()
}

/// Decode plain base64 or a `data:<mime>;base64,<payload>` URL.
pub fn decode_base64_payload(payload: &str) -> Result<Vec<u8>, BlobError> {
    let data = if payload.starts_with("data:") {
        payload.split(',').nth(1).unwrap_or_default()
    } else {
        payload
    };
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| BlobError::InvalidPayload(e.to_string()))
}
