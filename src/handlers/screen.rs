//! Active screen: set the pointer and read the populated configuration.

use crate::error::{AppError, ErrorBody};
use crate::handlers::resource::body_to_document;
use crate::model::SCREEN_CONFIGURATION;
use crate::response::success_one_ok;
use crate::service::ActiveScreenService;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

const ID_REQUIRED: &str = "Configuration ID is required in request body";
const NO_ACTIVE_SCREEN: &str = "No active screen configuration found. Please set one using /api/screen/set";

/// `id` from the body; missing, null, empty or non-string ids are rejected.
fn requested_id(body: Result<Json<Value>, JsonRejection>) -> Result<String, AppError> {
    let data = body_to_document(body)?;
    match data.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(AppError::BadRequest(ID_REQUIRED.into())),
    }
}

/// POST /api/screen-configurations/set-active: responds with the configuration.
pub async fn set_active(
    State(screens): State<ActiveScreenService>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = requested_id(body)?;
    let config = screens
        .set_active(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(SCREEN_CONFIGURATION.to_string()))?;
    Ok(success_one_ok(config))
}

/// POST /api/screen/set: responds with `{id, name}` only.
pub async fn set(
    State(screens): State<ActiveScreenService>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = requested_id(body)?;
    let config = screens
        .set_active(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Screen configuration".to_string()))?;
    Ok(success_one_ok(json!({ "id": config.id, "name": config.data.name })))
}

/// GET /api/screen
pub async fn get_active(State(screens): State<ActiveScreenService>) -> Result<Response, AppError> {
    let Some(config) = screens.get_active().await? else {
        return Ok((StatusCode::NOT_FOUND, Json(ErrorBody::new(NO_ACTIVE_SCREEN))).into_response());
    };
    Ok(success_one_ok(config))
}
