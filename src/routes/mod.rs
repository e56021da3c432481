//! Router assembly: every resource under `/api`, plus the common routes.

pub mod common;
pub mod resource;
pub mod screen;
pub mod storage;

pub use common::common_routes;
pub use resource::resource_routes;
pub use screen::{screen_routes, set_active_routes};
pub use storage::storage_routes;

use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// The full application router.
pub fn app(state: AppState) -> Router {
    let services = state.services;
    let api = Router::new()
        .nest("/movies", resource_routes(services.movies))
        .nest("/sections", resource_routes(services.sections))
        .nest(
            "/screen-configurations",
            set_active_routes(services.screens.clone()).merge(resource_routes(services.screen_configurations)),
        )
        .nest("/screen", screen_routes(services.screens))
        .nest("/s3", storage_routes(state.blobs));

    Router::new()
        .merge(common_routes(state.store))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
