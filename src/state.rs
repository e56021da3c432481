//! Shared application state for all routes.

use crate::blob::SharedBlobs;
use crate::model::Models;
use crate::service::Services;
use crate::store::SharedStore;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub blobs: SharedBlobs,
    pub services: Services,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(store: SharedStore, models: &Models, blobs: SharedBlobs, max_upload_bytes: usize) -> Self {
        AppState {
            store,
            blobs,
            services: Services::new(models),
            max_upload_bytes,
        }
    }
}
