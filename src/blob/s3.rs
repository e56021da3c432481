//! S3 (or S3-compatible) blob storage.

use crate::blob::BlobStorage;
use crate::error::BlobError;
use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use std::time::Duration;

const DEFAULT_REGION: &str = "us-east-1";

#[derive(Clone, Debug)]
pub struct S3BlobStorage {
    client: Client,
    bucket: String,
    region: String,
    endpoint: Option<String>,
    presign_expires: Duration,
}

fn backend<E: std::error::Error>(op: &str, err: E) -> BlobError {
    BlobError::Backend(format!("{}: {}", op, DisplayErrorContext(err)))
}

impl S3BlobStorage {
    /// Credentials come from the default provider chain. A custom `endpoint` switches to
    /// path-style addressing.
    pub async fn connect(bucket: &str, region: &str, endpoint: Option<&str>, presign_expires: Duration) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(url) = endpoint {
            builder = builder.endpoint_url(url).force_path_style(true);
        }
        tracing::info!(bucket, region, endpoint = ?endpoint, "s3 blob storage configured");
        S3BlobStorage {
            client: Client::from_conf(builder.build()),
            bucket: bucket.to_string(),
            region: region.to_string(),
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
            presign_expires,
        }
    }

    fn object_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint, self.bucket, key),
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket, key),
        }
    }
}

#[async_trait]
impl BlobStorage for S3BlobStorage {
    async fn ensure_bucket(&self) -> Result<(), BlobError> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                tracing::info!(bucket = %self.bucket, "bucket exists");
                return Ok(());
            }
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => {}
            Err(err) => return Err(backend("head bucket", err)),
        }
        let mut create = self.client.create_bucket().bucket(&self.bucket);
        if self.region != DEFAULT_REGION {
            create = create.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        create.send().await.map_err(|e| backend("create bucket", e))?;
        tracing::info!(bucket = %self.bucket, "bucket created");
        Ok(())
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, BlobError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| backend("put object", e))?;
        Ok(self.object_url(key))
    }

    async fn signed_download_url(&self, key: &str) -> Result<String, BlobError> {
        let presigning = PresigningConfig::expires_in(self.presign_expires).map_err(|e| backend("presign", e))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| backend("presign", e))?;
        Ok(request.uri().to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| backend("delete object", e))?;
        Ok(())
    }
}
