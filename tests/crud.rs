//! Service-level behaviour over the in-memory document store.

use homescreen_cms::query::{Filter, SortOption, SortOrder};
use homescreen_cms::service::Services;
use homescreen_cms::store::MemoryStore;
use homescreen_cms::types::Ref;
use homescreen_cms::{Models, QueryOptions, SectionType, SharedStore};
use serde_json::{json, Map, Value};
use std::sync::Arc;

async fn services() -> (Models, Services) {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let models = Models::init(store).await.unwrap();
    let services = Services::new(&models);
    (models, services)
}

fn doc(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap()
}

const MISSING: &str = "6f1c2a9e-3b7d-4c1e-9a55-000000000000";

#[tokio::test]
async fn missing_ids_resolve_to_none_for_every_resource() {
    let (_, s) = services().await;
    for id in [MISSING, "not-an-id"] {
        assert!(s.movies.get_by_id(id).await.unwrap().is_none());
        assert!(s.movies.update(id, doc(json!({"title": "x"}))).await.unwrap().is_none());
        assert!(s.movies.delete(id).await.unwrap().is_none());
        assert!(s.sections.get_by_id(id).await.unwrap().is_none());
        assert!(s.sections.update(id, doc(json!({"type": "TopChart"}))).await.unwrap().is_none());
        assert!(s.sections.delete(id).await.unwrap().is_none());
        assert!(s.screen_configurations.get_by_id(id).await.unwrap().is_none());
        assert!(s.screen_configurations.update(id, doc(json!({"name": "x"}))).await.unwrap().is_none());
        assert!(s.screen_configurations.delete(id).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn get_many_without_matches_is_empty() {
    let (_, s) = services().await;
    s.movies
        .create(doc(json!({"title": "Heat", "description": "d", "poster": "p"})))
        .await
        .unwrap();
    let options = QueryOptions {
        filters: Some(vec![Filter::eq("title", "Ronin")]),
        ..Default::default()
    };
    assert!(s.movies.get_many(options).await.unwrap().is_empty());
}

#[tokio::test]
async fn get_many_filters_ids_and_sorts() {
    let (_, s) = services().await;
    let mut ids = Vec::new();
    for (title, views) in [("Heat", 30), ("Heathers", 10), ("Ronin", 20)] {
        let m = s
            .movies
            .create(doc(json!({"title": title, "description": "d", "poster": "p", "views": views})))
            .await
            .unwrap();
        ids.push(m.id);
    }

    let found = s
        .movies
        .get_many(QueryOptions {
            filters: Some(vec![Filter::contains("title", "HEAT")]),
            sort: Some(vec![SortOption::new("views", SortOrder::Asc)]),
            ..Default::default()
        })
        .await
        .unwrap();
    let titles: Vec<&str> = found.iter().map(|m| m.data.title.as_str()).collect();
    assert_eq!(titles, ["Heathers", "Heat"]);

    let found = s
        .movies
        .get_many(QueryOptions {
            ids: Some(vec![ids[2].clone(), "garbage".into()]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, ids[2]);
}

#[tokio::test]
async fn hero_slider_keeps_items_and_other_types_drop_them() {
    let (_, s) = services().await;
    let hero = s
        .sections
        .create(doc(json!({"title": "Hero", "type": "HeroSlider", "items": ["m1", "m2"]})))
        .await
        .unwrap();
    let fetched = s.sections.get_by_id(&hero.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, hero.id);
    assert_eq!(fetched.data.section_type, Some(SectionType::HeroSlider));
    let items: Vec<&str> = fetched.data.items.iter().map(Ref::id).collect();
    assert_eq!(items, ["m1", "m2"]);

    let chart = s
        .sections
        .create(doc(json!({"title": "Top", "type": "TopChart", "items": ["m1"]})))
        .await
        .unwrap();
    assert!(chart.data.items.is_empty());

    // Switching the stored hero to a type without movies clears supplied items.
    let switched = s
        .sections
        .update(&hero.id, doc(json!({"type": "MostPopular", "items": ["m3"]})))
        .await
        .unwrap()
        .unwrap();
    assert!(switched.data.items.is_empty());

    // Items alone are checked against the stored type.
    let chart = s
        .sections
        .update(&chart.id, doc(json!({"items": ["m9"]})))
        .await
        .unwrap()
        .unwrap();
    assert!(chart.data.items.is_empty());
}

#[tokio::test]
async fn configuration_lookup_populates_sections_and_movies() {
    let (_, s) = services().await;
    let heat = s
        .movies
        .create(doc(json!({"title": "Heat", "description": "d", "poster": "p"})))
        .await
        .unwrap();
    let hero = s
        .sections
        .create(doc(json!({"title": "Hero", "type": "HeroSlider", "items": [heat.id, MISSING]})))
        .await
        .unwrap();
    let chart = s
        .sections
        .create(doc(json!({"title": "Top", "type": "TopChart"})))
        .await
        .unwrap();
    let config = s
        .screen_configurations
        .create(doc(json!({"name": "Home", "sections": [chart.id, MISSING, hero.id]})))
        .await
        .unwrap();

    let populated = s.screen_configurations.get_by_id(&config.id).await.unwrap().unwrap();
    let sections: Vec<_> = populated.data.sections.iter().map(|r| r.populated().unwrap()).collect();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].id, chart.id);
    assert_eq!(sections[1].id, hero.id);
    let movies: Vec<_> = sections[1].data.items.iter().map(|r| r.populated().unwrap()).collect();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].id, heat.id);
    assert_eq!(movies[0].data.title, "Heat");

    let listed = s.screen_configurations.get_many(QueryOptions::default()).await.unwrap();
    assert!(matches!(listed[0].data.sections[0], Ref::Id(_)));
}

#[tokio::test]
async fn set_active_points_the_singleton_at_existing_configurations() {
    let (models, s) = services().await;
    assert!(s.screens.get_active().await.unwrap().is_none());

    assert!(s.screens.set_active(MISSING).await.unwrap().is_none());
    assert!(models
        .active_config
        .find_one(Default::default())
        .await
        .unwrap()
        .is_none());

    let first = s
        .screen_configurations
        .create(doc(json!({"name": "Home"})))
        .await
        .unwrap();
    let second = s
        .screen_configurations
        .create(doc(json!({"name": "Holiday"})))
        .await
        .unwrap();

    let set = s.screens.set_active(&first.id).await.unwrap().unwrap();
    assert_eq!(set.id, first.id);
    assert_eq!(s.screens.get_active().await.unwrap().unwrap().id, first.id);

    s.screens.set_active(&second.id).await.unwrap().unwrap();
    let active = s.screens.get_active().await.unwrap().unwrap();
    assert_eq!(active.id, second.id);
    assert_eq!(active.data.name, "Holiday");

    // Still a single pointer record.
    let pointers = models
        .active_config
        .find(Default::default(), &Default::default())
        .await
        .unwrap();
    assert_eq!(pointers.len(), 1);

    // A deleted target leaves a dangling pointer, which reads as no active screen.
    s.screen_configurations.delete(&second.id).await.unwrap().unwrap();
    assert!(s.screens.get_active().await.unwrap().is_none());
}

#[tokio::test]
async fn pointer_without_configuration_reads_as_no_active_screen() {
    let (models, s) = services().await;
    models
        .active_config
        .find_one_and_upsert(Default::default(), Map::new())
        .await
        .unwrap();
    assert!(s.screens.get_active().await.unwrap().is_none());
}
