//! CrudService factory and the per-resource services built on it.

pub mod crud;
pub mod section;
pub mod screen_configuration;

pub use crud::{
    create_crud_service, create_fn, delete_fn, get_by_id_fn, get_many_fn, update_fn, CreateFn, CrudService,
    CrudServiceOptions, DeleteFn, Entity, GetByIdFn, GetManyFn, UpdateFn,
};
pub use screen_configuration::{populate_configuration, screen_configuration_service, ActiveScreenService};
pub use section::section_service;

use crate::model::{Models, MOVIE};
use crate::types::{Movie, ScreenConfiguration, Section};

pub fn movie_service(models: &Models) -> CrudService<Movie> {
    CrudService::new(CrudServiceOptions::new(models.movie.clone(), MOVIE))
}

/// Every resource service, built once from the compiled models.
#[derive(Clone)]
pub struct Services {
    pub movies: CrudService<Movie>,
    pub sections: CrudService<Section>,
    pub screen_configurations: CrudService<ScreenConfiguration>,
    pub screens: ActiveScreenService,
}

impl Services {
    pub fn new(models: &Models) -> Self {
        Services {
            movies: movie_service(models),
            sections: section_service(models.section.clone()),
            screen_configurations: screen_configuration_service(models),
            screens: ActiveScreenService::new(models.clone()),
        }
    }
}
