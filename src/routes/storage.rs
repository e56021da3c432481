//! Blob storage routes, mounted under `/api/s3`.

use crate::blob::SharedBlobs;
use crate::handlers::storage::{delete_file, download_url, upload, upload_base64};
use axum::{
    routing::{get, post},
    Router,
};

pub fn storage_routes(blobs: SharedBlobs) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .route("/upload-base64", post(upload_base64))
        .route("/file/:key", get(download_url).delete(delete_file))
        .with_state(blobs)
}
