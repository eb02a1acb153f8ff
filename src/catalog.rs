/// Remote manga catalog module.
///
/// This module provides a blocking HTTP client for the catalog API with a
/// configurable retry policy, the wire types it decodes, cover-art lookup and
/// caching, and link parsing for user input.
mod client;
mod cover;
mod payload;
mod reference;
mod retry;

pub use client::{
    CatalogApi, CatalogClient, CatalogClientBuilder, CatalogError, DEFAULT_API_URL,
    DEFAULT_UPLOADS_URL, ItemMetadata, item_metadata_from,
};
pub use cover::{CoverImage, CoverSource, ImageCache, resolve_cover_file};
pub use payload::{ItemEnvelope, ListingPage, Localized, MangaAttributes, MangaRecord, Relationship};
pub use reference::extract_manga_id;
pub use retry::{Exhausted, RetryPolicy, StatusCode};
