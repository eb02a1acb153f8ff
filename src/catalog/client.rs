/// Catalog HTTP client implementation.
///
/// This module provides `CatalogClient` for making synchronous HTTP requests to
/// the remote manga catalog, along with its error type and builder.
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::cover::resolve_cover_file;
use super::payload::{CoverList, ItemEnvelope, ListingPage};
use super::retry::{Exhausted, RetryPolicy};
use crate::models::{MangaId, TagSet};

pub const DEFAULT_API_URL: &str = "https://api.mangadex.org";
pub const DEFAULT_UPLOADS_URL: &str = "https://uploads.mangadex.org";

/// Errors that can occur when talking to the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// User input did not contain a recognizable item identifier.
    #[error("Invalid catalog link: {0}")]
    InvalidReference(String),

    /// The retry budget ran out without a successful response.
    #[error("Catalog unavailable: status {status} after {attempts} attempts")]
    RemoteService { status: u16, attempts: usize },

    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// JSON deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The item exists but lacks a localization the pipeline needs.
    #[error("Unusable catalog item {id}: {reason}")]
    DataShape { id: String, reason: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Local filesystem errors (image cache)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// True when the remote side, not the input, is at fault.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            CatalogError::RemoteService { .. } | CatalogError::Network(_)
        )
    }
}

impl From<Exhausted<reqwest::Error>> for CatalogError {
    fn from(exhausted: Exhausted<reqwest::Error>) -> Self {
        match exhausted {
            Exhausted::Status { status, attempts } => {
                warn!(status, attempts, "catalog request exhausted retries");
                CatalogError::RemoteService { status, attempts }
            }
            Exhausted::Error { error, attempts } => {
                warn!(attempts, error = %error, "catalog request failed");
                CatalogError::Network(error)
            }
        }
    }
}

/// Title, synopsis, tags and cover of a single catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMetadata {
    pub id: MangaId,
    pub title: String,
    pub synopsis: String,
    pub tags: TagSet,
    pub cover_file: Option<String>,
}

/// Operations the pipeline needs from the catalog.
///
/// This trait enables mocking in tests and lets the dataset builder and the
/// lookup service run against canned payloads.
pub trait CatalogApi {
    /// Fetches one page of the English-translated listing.
    fn fetch_listing_page(&self, limit: usize, offset: usize) -> Result<ListingPage, CatalogError>;

    /// Fetches a single item with its cover relationship expanded.
    fn fetch_item_metadata(&self, id: &MangaId) -> Result<ItemMetadata, CatalogError>;

    /// Looks up the cover file name through the dedicated cover endpoint.
    fn fetch_cover_filename(&self, id: &MangaId) -> Result<Option<String>, CatalogError>;

    /// Downloads raw bytes from the upload host.
    fn download(&self, url: &str) -> Result<Vec<u8>, CatalogError>;

    /// Builds the upload-host URL for a cover file.
    fn cover_url(&self, id: &MangaId, file_name: &str, thumbnail: bool) -> String;
}

/// Builder for constructing `CatalogClient` instances.
///
/// # Examples
///
/// ```
/// use mangenre::catalog::CatalogClientBuilder;
///
/// let client = CatalogClientBuilder::new()
///     .base_url("https://api.mangadex.org")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.base_url(), "https://api.mangadex.org");
/// ```
#[derive(Debug, Default)]
pub struct CatalogClientBuilder {
    base_url: Option<String>,
    uploads_url: Option<String>,
    retry: Option<RetryPolicy>,
}

impl CatalogClientBuilder {
    /// Creates a new `CatalogClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for the catalog API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the base URL of the image upload host.
    pub fn uploads_url(mut self, url: impl Into<String>) -> Self {
        self.uploads_url = Some(url.into());
        self
    }

    /// Sets the retry policy applied to every API request.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Builds the `CatalogClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// If `base_url()` was not called, `MANGENRE_API_URL` is consulted before
    /// falling back to the public API. `uploads_url()` likewise falls back to
    /// `MANGENRE_UPLOADS_URL`.
    pub fn build(self) -> Result<CatalogClient, CatalogError> {
        let base_url = self.base_url.unwrap_or_else(|| {
            std::env::var("MANGENRE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
        });
        let uploads_url = self.uploads_url.unwrap_or_else(|| {
            std::env::var("MANGENRE_UPLOADS_URL")
                .unwrap_or_else(|_| DEFAULT_UPLOADS_URL.to_string())
        });

        for url in [&base_url, &uploads_url] {
            reqwest::Url::parse(url)
                .map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", url, e)))?;
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("mangenre/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CatalogError::Network)?;

        Ok(CatalogClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            uploads_url: uploads_url.trim_end_matches('/').to_string(),
            retry: self.retry.unwrap_or_default(),
        })
    }
}

/// Synchronous HTTP client for the remote catalog.
///
/// Every API call goes through the configured [`RetryPolicy`].
pub struct CatalogClient {
    client: reqwest::blocking::Client,
    base_url: String,
    uploads_url: String,
    retry: RetryPolicy,
}

impl CatalogClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn uploads_url(&self) -> &str {
        &self.uploads_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// GETs `path` with query pairs under the retry policy and decodes JSON.
    fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, CatalogError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "catalog request");

        let response = self
            .retry
            .run(|| self.client.get(&url).query(query).send())?;
        let body = response.text().map_err(CatalogError::Network)?;
        serde_json::from_str(&body).map_err(CatalogError::Serialization)
    }
}

impl CatalogApi for CatalogClient {
    fn fetch_listing_page(&self, limit: usize, offset: usize) -> Result<ListingPage, CatalogError> {
        self.get_json(
            "/manga",
            &[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("availableTranslatedLanguage[]", "en".to_string()),
            ],
        )
    }

    fn fetch_item_metadata(&self, id: &MangaId) -> Result<ItemMetadata, CatalogError> {
        let envelope: ItemEnvelope = self.get_json(
            &format!("/manga/{}", id),
            &[("includes[]", "cover_art".to_string())],
        )?;
        item_metadata_from(id, &envelope)
    }

    fn fetch_cover_filename(&self, id: &MangaId) -> Result<Option<String>, CatalogError> {
        let covers: CoverList = self.get_json("/cover", &[("manga[]", id.to_string())])?;
        Ok(covers
            .data
            .first()
            .and_then(|cover| cover.file_name())
            .map(str::to_string))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        let response = self.client.get(url).send().map_err(CatalogError::Network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::RemoteService {
                status: status.as_u16(),
                attempts: 1,
            });
        }
        let bytes = response.bytes().map_err(CatalogError::Network)?;
        Ok(bytes.to_vec())
    }

    fn cover_url(&self, id: &MangaId, file_name: &str, thumbnail: bool) -> String {
        let suffix = if thumbnail { ".256.jpg" } else { "" };
        format!("{}/covers/{}/{}{}", self.uploads_url, id, file_name, suffix)
    }
}

/// Resolves display fields from an item envelope.
///
/// Title and synopsis prefer English and fall back to the first non-blank
/// localization; having none for either is a data error.
pub fn item_metadata_from(id: &MangaId, envelope: &ItemEnvelope) -> Result<ItemMetadata, CatalogError> {
    let attributes = &envelope.data.attributes;

    let title = attributes
        .title
        .preferred_or_first("en")
        .ok_or_else(|| CatalogError::DataShape {
            id: id.to_string(),
            reason: "no usable title localization".to_string(),
        })?;
    let synopsis = attributes
        .description
        .preferred_or_first("en")
        .ok_or_else(|| CatalogError::DataShape {
            id: id.to_string(),
            reason: "no usable description localization".to_string(),
        })?;

    Ok(ItemMetadata {
        id: id.clone(),
        title: title.to_string(),
        synopsis: synopsis.to_string(),
        tags: attributes.english_tags().into_iter().collect(),
        cover_file: resolve_cover_file(envelope).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn envelope(json: &str) -> ItemEnvelope {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn remote_service_error_reports_status_and_attempts() {
        let err = CatalogError::RemoteService {
            status: 503,
            attempts: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("3 attempts"));
        assert!(err.is_remote());
    }

    #[test]
    fn invalid_reference_is_not_remote() {
        let err = CatalogError::InvalidReference("nope".to_string());
        assert!(!err.is_remote());
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn exhausted_status_maps_to_remote_service() {
        let err = CatalogError::from(Exhausted::Status {
            status: 500,
            attempts: 3,
        });
        assert!(matches!(
            err,
            CatalogError::RemoteService {
                status: 500,
                attempts: 3
            }
        ));
    }

    #[test]
    fn build_returns_error_if_invalid_url_provided() {
        let result = CatalogClientBuilder::new().base_url("not-a-valid-url").build();
        assert!(matches!(result, Err(CatalogError::InvalidUrl(_))));
    }

    #[test]
    #[serial]
    fn build_uses_default_urls_when_not_configured() {
        unsafe {
            std::env::remove_var("MANGENRE_API_URL");
            std::env::remove_var("MANGENRE_UPLOADS_URL");
        }
        let client = CatalogClientBuilder::new().build().unwrap();
        assert_eq!(client.base_url(), DEFAULT_API_URL);
        assert_eq!(client.uploads_url(), DEFAULT_UPLOADS_URL);
    }

    #[test]
    #[serial]
    fn builder_value_takes_precedence_over_environment() {
        unsafe {
            std::env::set_var("MANGENRE_API_URL", "http://env-host:8080");
        }
        let from_env = CatalogClientBuilder::new().build().unwrap();
        let explicit = CatalogClientBuilder::new()
            .base_url("http://builder-host:8080/")
            .build()
            .unwrap();
        unsafe {
            std::env::remove_var("MANGENRE_API_URL");
        }

        assert_eq!(from_env.base_url(), "http://env-host:8080");
        assert_eq!(explicit.base_url(), "http://builder-host:8080");
    }

    #[test]
    fn cover_url_supports_thumbnail_variant() {
        let client = CatalogClientBuilder::new()
            .base_url("http://api.local")
            .uploads_url("http://uploads.local")
            .build()
            .unwrap();
        let id = MangaId::new("abc");
        assert_eq!(
            client.cover_url(&id, "x.jpg", false),
            "http://uploads.local/covers/abc/x.jpg"
        );
        assert_eq!(
            client.cover_url(&id, "x.jpg", true),
            "http://uploads.local/covers/abc/x.jpg.256.jpg"
        );
    }

    #[test]
    fn metadata_prefers_english_localization() {
        let env = envelope(
            r#"{"data": {"id": "abc", "attributes": {
                "title": {"ja": "タイトル", "en": "Title"},
                "description": {"ja": "説明", "en": "Synopsis"},
                "tags": [{"attributes": {"name": {"en": "Action"}}}]
            }}}"#,
        );
        let meta = item_metadata_from(&MangaId::new("abc"), &env).unwrap();
        assert_eq!(meta.title, "Title");
        assert_eq!(meta.synopsis, "Synopsis");
        assert!(meta.tags.contains("Action"));
        assert_eq!(meta.cover_file, None);
    }

    #[test]
    fn metadata_falls_back_to_first_localization() {
        let env = envelope(
            r#"{"data": {"id": "abc", "attributes": {
                "title": {"ja-ro": "Taitoru"},
                "description": {"pt-br": "Sinopse"}
            }}}"#,
        );
        let meta = item_metadata_from(&MangaId::new("abc"), &env).unwrap();
        assert_eq!(meta.title, "Taitoru");
        assert_eq!(meta.synopsis, "Sinopse");
    }

    #[test]
    fn metadata_without_localizations_is_a_data_shape_error() {
        let env = envelope(
            r#"{"data": {"id": "abc", "attributes": {"title": {"en": "T"}, "description": []}}}"#,
        );
        let err = item_metadata_from(&MangaId::new("abc"), &env).unwrap_err();
        assert!(matches!(err, CatalogError::DataShape { .. }));
    }

    #[test]
    fn blank_english_falls_back_to_next_localization() {
        let env = envelope(
            r#"{"data": {"id": "abc", "attributes": {
                "title": {"en": "", "ja": "タイトル"},
                "description": {"en": "", "ja": "あらすじ"}
            }}}"#,
        );
        let meta = item_metadata_from(&MangaId::new("abc"), &env).unwrap();
        assert_eq!(meta.title, "タイトル");
        assert_eq!(meta.synopsis, "あらすじ");
    }

    #[test]
    fn all_blank_localizations_are_a_data_shape_error() {
        let env = envelope(
            r#"{"data": {"id": "abc", "attributes": {
                "title": {"en": "Title"},
                "description": {"en": "", "ja": "  "}
            }}}"#,
        );
        let err = item_metadata_from(&MangaId::new("abc"), &env).unwrap_err();
        assert!(matches!(err, CatalogError::DataShape { .. }));
    }
}
