//! Resource types as they leave the service layer.

use crate::format::WithId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Explicit `null` reads as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Section layouts. Only hero sliders carry hand-picked movies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionType {
    HeroSlider,
    TopChart,
    MostTrending,
    ContinueWatching,
    MostPopular,
}

impl SectionType {
    pub const ALL: [SectionType; 5] = [
        SectionType::HeroSlider,
        SectionType::TopChart,
        SectionType::MostTrending,
        SectionType::ContinueWatching,
        SectionType::MostPopular,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::HeroSlider => "HeroSlider",
            SectionType::TopChart => "TopChart",
            SectionType::MostTrending => "MostTrending",
            SectionType::ContinueWatching => "ContinueWatching",
            SectionType::MostPopular => "MostPopular",
        }
    }

    pub fn includes_movies(&self) -> bool {
        matches!(self, SectionType::HeroSlider)
    }
}

impl std::str::FromStr for SectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown section type: {}", s))
    }
}

/// A reference that is either a bare id or the populated document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Id(String),
    Populated(Box<WithId<T>>),
}

impl<T> Ref<T> {
    pub fn id(&self) -> &str {
        match self {
            Ref::Id(id) => id,
            Ref::Populated(doc) => &doc.id,
        }
    }

    pub fn populated(&self) -> Option<&WithId<T>> {
        match self {
            Ref::Id(_) => None,
            Ref::Populated(doc) => Some(doc),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub poster: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Image showing how the section should look.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<SectionType>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<Ref<Movie>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenConfiguration {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: Vec<Ref<Section>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Singleton pointer to the active screen configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveConfig {
    pub screen_config_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn section_type_round_trips_through_str() {
        for t in SectionType::ALL {
            assert_eq!(t.as_str().parse::<SectionType>(), Ok(t));
        }
        assert!("Carousel".parse::<SectionType>().is_err());
        assert!(SectionType::HeroSlider.includes_movies());
        assert!(!SectionType::TopChart.includes_movies());
    }

    #[test]
    fn refs_accept_ids_and_populated_documents() {
        let section: Section = serde_json::from_value(json!({
            "title": "Featured",
            "type": "HeroSlider",
            "items": ["m1", { "id": "m2", "title": "Dune", "description": "", "poster": "", "tags": [] }]
        }))
        .unwrap();
        assert_eq!(section.items[0], Ref::Id("m1".into()));
        assert_eq!(section.items[1].id(), "m2");
        assert_eq!(section.items[1].populated().map(|m| m.data.title.as_str()), Some("Dune"));
    }
}
