//! REST handlers shared by every CRUD resource. Router state is the resource's `CrudService`.

use crate::error::AppError;
use crate::extractors::ListQuery;
use crate::format::Document;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::{CrudService, Entity};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Response,
    Json,
};
use serde_json::{json, Value};

/// Request body as a JSON object. Malformed JSON and non-object bodies are 400s.
pub fn body_to_document(body: Result<Json<Value>, JsonRejection>) -> Result<Document, AppError> {
    let Json(value) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

fn not_found<T: Entity>(service: &CrudService<T>) -> AppError {
    AppError::NotFound(service.entity_name().to_string())
}

pub async fn list<T: Entity>(
    State(service): State<CrudService<T>>,
    ListQuery(options): ListQuery,
) -> Result<Response, AppError> {
    let items = service.get_many(options).await?;
    Ok(success_many(items))
}

pub async fn read<T: Entity>(
    State(service): State<CrudService<T>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let item = service.get_by_id(&id).await?.ok_or_else(|| not_found(&service))?;
    Ok(success_one_ok(item))
}

pub async fn create<T: Entity>(
    State(service): State<CrudService<T>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let data = body_to_document(body)?;
    let item = service.create(data).await?;
    Ok(success_one(item))
}

/// PUT and PATCH: both merge the supplied fields.
pub async fn update<T: Entity>(
    State(service): State<CrudService<T>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let data = body_to_document(body)?;
    let item = service.update(&id, data).await?.ok_or_else(|| not_found(&service))?;
    Ok(success_one_ok(item))
}

pub async fn delete<T: Entity>(
    State(service): State<CrudService<T>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    service.delete(&id).await?.ok_or_else(|| not_found(&service))?;
    Ok(success_one_ok(json!({ "id": id })))
}
