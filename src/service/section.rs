//! Sections only keep movie items when their type shows movies.

use crate::format::{format_entity, Document};
use crate::model::{Model, SECTION};
use crate::service::crud::{create_fn, log_failure, update_fn, CrudService, CrudServiceOptions};
use crate::types::{Section, SectionType};
use serde_json::Value;
use std::sync::Arc;

const TYPE_FIELD: &str = "type";
const ITEMS_FIELD: &str = "items";

fn carries_items(section_type: Option<&Value>) -> bool {
    section_type
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<SectionType>().ok())
        .is_some_and(|t| t.includes_movies())
}

fn is_supplied(data: &Document, field: &str) -> bool {
    data.get(field).is_some_and(|v| !v.is_null())
}

pub fn section_service(model: Arc<Model>) -> CrudService<Section> {
    let create_model = model.clone();
    let create = create_fn(move |mut data: Document| {
        let model = create_model.clone();
        async move {
            if is_supplied(&data, ITEMS_FIELD) && !carries_items(data.get(TYPE_FIELD)) {
                data.insert(ITEMS_FIELD.to_string(), Value::Array(Vec::new()));
            }
            let doc = model
                .create(data)
                .await
                .inspect_err(|e| log_failure(SECTION, "create", e))?;
            format_entity(doc)
        }
    });

    let update_model = model.clone();
    let update = update_fn(move |id: String, mut data: Document| {
        let model = update_model.clone();
        async move {
            if is_supplied(&data, TYPE_FIELD) || is_supplied(&data, ITEMS_FIELD) {
                let Some(current) = model.find_by_id(&id).await? else {
                    return Ok(None);
                };
                let effective = if is_supplied(&data, TYPE_FIELD) {
                    data.get(TYPE_FIELD)
                } else {
                    current.get(TYPE_FIELD)
                };
                if !carries_items(effective) && is_supplied(&data, ITEMS_FIELD) {
                    data.insert(ITEMS_FIELD.to_string(), Value::Array(Vec::new()));
                }
            }
            let doc = model
                .find_by_id_and_update(&id, data)
                .await
                .inspect_err(|e| log_failure(SECTION, "update", e))?;
            doc.map(format_entity).transpose()
        }
    });

    CrudService::new(
        CrudServiceOptions::new(model, SECTION)
            .with_create(create)
            .with_update(update),
    )
}
