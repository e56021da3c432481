//! REST routes for one CRUD resource: `/`, `/:id`.

use crate::handlers::resource::{create, delete, list, read, update};
use crate::service::{CrudService, Entity};
use axum::{routing::get, Router};

pub fn resource_routes<T: Entity>(service: CrudService<T>) -> Router {
    Router::new()
        .route("/", get(list::<T>).post(create::<T>))
        .route(
            "/:id",
            get(read::<T>).put(update::<T>).patch(update::<T>).delete(delete::<T>),
        )
        .with_state(service)
}
