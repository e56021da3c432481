//! Success responses: the payload itself, no envelope.

use crate::error::ErrorBody;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Serialize `data` with `status`. A payload that fails to encode becomes a 500 error body.
pub fn payload<T: Serialize>(status: StatusCode, data: &T) -> Response {
    match serde_json::to_value(data) {
        Ok(value) => (status, Json(value)).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "response payload could not be serialized");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new(format!("serialization: {}", e))),
            )
                .into_response()
        }
    }
}

pub fn success_one<T: Serialize>(data: T) -> Response {
    payload(StatusCode::CREATED, &data)
}

pub fn success_one_ok<T: Serialize>(data: T) -> Response {
    payload(StatusCode::OK, &data)
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> Response {
    payload(StatusCode::OK, &data)
}
