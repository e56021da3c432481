//! Media uploads into blob storage. Keys are content hashes, so re-uploads are idempotent.

use crate::blob::{decode_base64_payload, extension_for_content_type, extension_for_file_name, file_key, SharedBlobs};
use crate::error::AppError;
use crate::handlers::resource::body_to_document;
use crate::response::success_one_ok;
use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    response::Response,
    Json,
};
use serde::Serialize;
use serde_json::Value;

const FILE_FIELD: &str = "file";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Serialize)]
pub struct UploadBody {
    pub key: String,
    pub success: bool,
    pub url: String,
}

#[derive(Serialize)]
pub struct DownloadBody {
    pub success: bool,
    pub url: String,
}

#[derive(Serialize)]
pub struct DeleteBody {
    pub message: &'static str,
    pub success: bool,
}

/// POST /api/s3/upload: multipart form with a `file` part.
pub async fn upload(State(blobs): State<SharedBlobs>, mut multipart: Multipart) -> Result<Response, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let extension = field.file_name().map(extension_for_file_name).unwrap_or_default();
        let content_type = field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE).to_string();
        let bytes = field.bytes().await.map_err(|e| AppError::BadRequest(e.body_text()))?;
        let key = file_key(&bytes, &extension);
        let url = blobs.put(&key, bytes.to_vec(), &content_type).await?;
        tracing::info!(key = %key, size = bytes.len(), "file uploaded");
        return Ok(success_one_ok(UploadBody { key, success: true, url }));
    }
    Err(AppError::BadRequest("No file provided".into()))
}

/// POST /api/s3/upload-base64: `{file, contentType, key?}`, `file` plain base64 or a data URL.
pub async fn upload_base64(
    State(blobs): State<SharedBlobs>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let data = body_to_document(body)?;
    let payload = data
        .get(FILE_FIELD)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("No file data provided".into()))?;
    let content_type = data
        .get("contentType")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    let bytes = decode_base64_payload(payload)?;
    let key = match data.get("key").and_then(Value::as_str).filter(|k| !k.is_empty()) {
        Some(key) => key.to_string(),
        None => file_key(&bytes, &extension_for_content_type(content_type)),
    };
    let size = bytes.len();
    let url = blobs.put(&key, bytes, content_type).await?;
    tracing::info!(key = %key, size, "file uploaded");
    Ok(success_one_ok(UploadBody { key, success: true, url }))
}

/// GET /api/s3/file/:key
pub async fn download_url(State(blobs): State<SharedBlobs>, Path(key): Path<String>) -> Result<Response, AppError> {
    let url = blobs.signed_download_url(&key).await?;
    Ok(success_one_ok(DownloadBody { success: true, url }))
}

/// DELETE /api/s3/file/:key
pub async fn delete_file(State(blobs): State<SharedBlobs>, Path(key): Path<String>) -> Result<Response, AppError> {
    blobs.delete(&key).await?;
    tracing::info!(key = %key, "file deleted");
    Ok(success_one_ok(DeleteBody {
        message: "File deleted successfully",
        success: true,
    }))
}
