//! Active-screen routes.

use crate::handlers::screen::{get_active, set, set_active};
use crate::service::ActiveScreenService;
use axum::{
    routing::{get, post},
    Router,
};

/// Mounted under `/api/screen`.
pub fn screen_routes(screens: ActiveScreenService) -> Router {
    Router::new()
        .route("/", get(get_active))
        .route("/set", post(set))
        .with_state(screens)
}

/// Merged into `/api/screen-configurations`.
pub fn set_active_routes(screens: ActiveScreenService) -> Router {
    Router::new().route("/set-active", post(set_active)).with_state(screens)
}
