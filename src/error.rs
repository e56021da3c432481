//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("missing setting: {0}")]
    Missing(&'static str),
}

/// Failures raised by a document store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("corrupt record in {collection}: {reason}")]
    Corrupt { collection: String, reason: String },
    #[error("duplicate id {id} in {collection}")]
    Duplicate { collection: String, id: String },
}

/// Failures raised by a blob storage backend.
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("blob storage: {0}")]
    Backend(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Blob(BlobError::InvalidPayload(_)) => StatusCode::BAD_REQUEST,
            AppError::Store(_) | AppError::Blob(_) | AppError::Serialization(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error shape shared by every failing response.
#[derive(Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorBody {
            success: false,
            error: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_resource() {
        let err = AppError::NotFound("Section".into());
        assert_eq!(err.to_string(), "Section not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_failures_map_to_server_error() {
        let err = AppError::from(StoreError::Corrupt {
            collection: "movies".into(),
            reason: "not an object".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("movies"));
    }

    #[test]
    fn validation_maps_to_bad_request() {
        assert_eq!(AppError::Validation("title is required".into()).status(), StatusCode::BAD_REQUEST);
    }
}
