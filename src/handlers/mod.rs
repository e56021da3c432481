//! HTTP handlers. Each returns `Result<Response, AppError>`; errors render as `{success, error}`.

pub mod resource;
pub mod screen;
pub mod storage;
