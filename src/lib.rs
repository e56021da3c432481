//! Homescreen CMS: content backend for streaming home screens.
//!
//! Movies, sections and screen configurations are stored as schemaless documents; their
//! persistence schemas are derived once from declarative form schemas. A generic CRUD service
//! factory (with per-operation overrides) backs every REST resource.

pub mod blob;
pub mod error;
pub mod extractors;
pub mod format;
pub mod handlers;
pub mod model;
pub mod query;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;
pub mod types;

pub use blob::{BlobConfig, BlobStorage, SharedBlobs};
pub use error::{AppError, BlobError, ConfigError, StoreError};
pub use format::{format_document, WithId};
pub use model::{Model, Models};
pub use query::{build_query, get_filter_options, get_sort_options, QueryOptions};
pub use response::{success_many, success_one, success_one_ok};
pub use routes::{app, common_routes};
pub use schema::convert;
pub use service::{create_crud_service, CrudService, CrudServiceOptions, Services};
pub use settings::Settings;
pub use state::AppState;
pub use store::{ensure_database_exists, DocumentStore, SharedStore, StoreConfig, StoreConnector};
pub use types::{ActiveConfig, Movie, ScreenConfiguration, Section, SectionType};
