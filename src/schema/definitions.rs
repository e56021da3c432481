//! Form schemas for each resource. Converted once at startup into persistence schemas.

use crate::schema::types::{Dependency, DependencyAlternative, FormSchema, SchemaProperty};
use crate::types::SectionType;

pub fn movie_schema() -> FormSchema {
    FormSchema::new()
        .property(
            "title",
            SchemaProperty::string()
                .with_title("Title")
                .with_description("Movie title displayed in the UI"),
        )
        .property(
            "description",
            SchemaProperty::string()
                .with_title("Description")
                .with_description("Brief synopsis of the movie"),
        )
        .property(
            "poster",
            SchemaProperty::string()
                .with_title("Poster URL")
                .with_description("URL to the movie poster image"),
        )
        .property(
            "tags",
            SchemaProperty::array_of(SchemaProperty::string())
                .with_title("Tags")
                .with_description("Categories or genres that the movie belongs to"),
        )
        .property("episodes", SchemaProperty::number().with_title("Episodes"))
        .property("views", SchemaProperty::number().with_title("Views").with_default(0))
        .required(["title", "description", "poster"])
}

pub fn section_schema() -> FormSchema {
    let type_names: Vec<&'static str> = SectionType::ALL.iter().map(SectionType::as_str).collect();
    let without_movies: Vec<&'static str> = SectionType::ALL
        .iter()
        .filter(|t| !t.includes_movies())
        .map(SectionType::as_str)
        .collect();

    let mut with_items = DependencyAlternative {
        required: vec!["items".into()],
        ..Default::default()
    };
    with_items.properties.insert(
        "items".into(),
        SchemaProperty::array_of(SchemaProperty::string()).with_title("Movies"),
    );
    with_items
        .properties
        .insert("type".into(), SchemaProperty::enumeration([SectionType::HeroSlider.as_str()]));

    let mut without_items = DependencyAlternative::default();
    without_items
        .properties
        .insert("type".into(), SchemaProperty::enumeration(without_movies));

    FormSchema::new()
        .property("title", SchemaProperty::string().with_title("Title"))
        .property("description", SchemaProperty::string().with_title("Description"))
        .property(
            "design",
            SchemaProperty::string()
                .with_title("Design Image")
                .with_description("This image should show how this section should look"),
        )
        .property(
            "type",
            SchemaProperty::string().with_title("Section Type").with_enum(type_names),
        )
        .required(["title", "type"])
        .dependency(
            "type",
            Dependency {
                one_of: vec![with_items, without_items],
            },
        )
}

pub fn screen_configuration_schema() -> FormSchema {
    FormSchema::new()
        .property(
            "name",
            SchemaProperty::string()
                .with_title("Name")
                .with_description("Configuration name displayed in the UI"),
        )
        .property(
            "description",
            SchemaProperty::string()
                .with_title("Description")
                .with_description("Brief description of this screen configuration"),
        )
        .property(
            "sections",
            SchemaProperty::array_of(SchemaProperty::string())
                .with_title("Sections")
                .with_description("Section IDs included in this configuration"),
        )
        .required(["name", "sections"])
}

pub fn active_config_schema() -> FormSchema {
    FormSchema::new().property(
        "screenConfigId",
        SchemaProperty::string().required_as("screenConfigId"),
    )
}
