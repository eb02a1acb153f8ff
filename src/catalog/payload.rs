//! Wire types for the catalog's JSON responses.
//!
//! Only the fields the pipeline reads are modelled; everything else in the
//! payload is ignored by serde.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A locale-keyed text map such as `{"en": "...", "ja": "..."}`.
///
/// The service sends an empty JSON array instead of an object when a field
/// has no localizations, so any non-object value decodes as empty. Entry
/// order follows the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Localized(Vec<(String, String)>);

impl Localized {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Text for an exact locale key. Blank entries count as absent.
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.usable().find(|(key, _)| *key == locale).map(|(_, text)| text)
    }

    /// First non-blank localization in payload order.
    pub fn first(&self) -> Option<&str> {
        self.usable().next().map(|(_, text)| text)
    }

    /// Preferred locale, else the first usable entry.
    pub fn preferred_or_first(&self, locale: &str) -> Option<&str> {
        self.get(locale).or_else(|| self.first())
    }

    /// True if no entry carries usable text.
    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }

    fn usable(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(key, text)| (key.as_str(), text.as_str()))
    }
}

impl<'de> Deserialize<'de> for Localized {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let pairs = match value {
            Value::Object(map) => map
                .into_iter()
                .filter_map(|(key, text)| match text {
                    Value::String(s) => Some((key, s)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(Self(pairs))
    }
}

/// One page of `GET /manga`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingPage {
    #[serde(default)]
    pub data: Vec<MangaRecord>,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub total: usize,
}

/// Envelope of `GET /manga/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemEnvelope {
    pub data: MangaRecord,
    #[serde(default)]
    pub included: Vec<Relationship>,
}

/// A catalog item as the service describes it.
#[derive(Debug, Clone, Deserialize)]
pub struct MangaRecord {
    pub id: String,
    pub attributes: MangaAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaAttributes {
    #[serde(default)]
    pub title: Localized,
    #[serde(default)]
    pub alt_titles: Vec<Localized>,
    #[serde(default)]
    pub description: Localized,
    #[serde(default)]
    pub tags: Vec<TagRecord>,
}

impl MangaAttributes {
    /// Title in `locale`, looking at the main title map before `altTitles`.
    pub fn title_in(&self, locale: &str) -> Option<&str> {
        self.title
            .get(locale)
            .or_else(|| self.alt_titles.iter().find_map(|alt| alt.get(locale)))
    }

    /// English tag names; tags lacking one are skipped.
    pub fn english_tags(&self) -> Vec<String> {
        self.tags
            .iter()
            .filter_map(|tag| tag.attributes.name.get("en"))
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagRecord {
    #[serde(default)]
    pub attributes: TagAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagAttributes {
    #[serde(default)]
    pub name: Localized,
}

/// An entry of `relationships` or `included`.
#[derive(Debug, Clone, Deserialize)]
pub struct Relationship {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Option<Value>,
}

impl Relationship {
    /// `attributes.fileName` when present.
    pub fn file_name(&self) -> Option<&str> {
        self.attributes
            .as_ref()
            .and_then(|attrs| attrs.get("fileName"))
            .and_then(Value::as_str)
    }
}

/// Envelope of `GET /cover?manga[]={id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoverList {
    #[serde(default)]
    pub data: Vec<Relationship>,
}
