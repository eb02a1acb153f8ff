//! Cover art lookup and the local image cache.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::client::CatalogApi;
use super::payload::{ItemEnvelope, Relationship};
use crate::models::MangaId;

const COVER_KIND: &str = "cover_art";

/// Where in an item envelope a cover file name may live.
///
/// The service places expanded cover relationships in either list, so
/// lookups walk [`CoverSource::CHAIN`] in order and stop at the first hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverSource {
    Relationships,
    Included,
}

impl CoverSource {
    pub const CHAIN: [CoverSource; 2] = [CoverSource::Relationships, CoverSource::Included];

    fn entries<'a>(&self, envelope: &'a ItemEnvelope) -> &'a [Relationship] {
        match self {
            CoverSource::Relationships => &envelope.data.relationships,
            CoverSource::Included => &envelope.included,
        }
    }

    /// File name of the first cover entry in this source.
    pub fn lookup<'a>(&self, envelope: &'a ItemEnvelope) -> Option<&'a str> {
        self.entries(envelope)
            .iter()
            .filter(|entry| entry.kind == COVER_KIND)
            .find_map(Relationship::file_name)
    }
}

/// Walks the lookup chain; `None` means the caller shows a placeholder.
pub fn resolve_cover_file(envelope: &ItemEnvelope) -> Option<&str> {
    CoverSource::CHAIN
        .iter()
        .find_map(|source| source.lookup(envelope))
}

/// Result of asking the cache for an item's cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverImage {
    Cached(PathBuf),
    Placeholder,
}

impl CoverImage {
    pub fn path(&self) -> Option<&Path> {
        match self {
            CoverImage::Cached(path) => Some(path),
            CoverImage::Placeholder => None,
        }
    }
}

/// Cover images stored on disk as `{dir}/{item id}.jpg`.
///
/// A file that already exists is never fetched again. Download failures
/// degrade to [`CoverImage::Placeholder`].
#[derive(Debug, Clone)]
pub struct ImageCache {
    dir: PathBuf,
    thumbnail: bool,
}

impl ImageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            thumbnail: false,
        }
    }

    /// Fetch the 256px variant instead of the full-size image.
    pub fn thumbnails(mut self) -> Self {
        self.thumbnail = true;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &MangaId) -> PathBuf {
        self.dir.join(format!("{}.jpg", id))
    }

    /// Returns the cached cover for `id`, downloading it if needed.
    pub fn fetch(
        &self,
        client: &dyn CatalogApi,
        id: &MangaId,
        file_name: Option<&str>,
    ) -> CoverImage {
        let path = self.path_for(id);
        if path.exists() {
            return CoverImage::Cached(path);
        }

        let Some(file_name) = file_name else {
            return CoverImage::Placeholder;
        };

        let url = client.cover_url(id, file_name, self.thumbnail);
        let written = client
            .download(&url)
            .and_then(|bytes| self.store(&path, &bytes).map_err(Into::into));

        match written {
            Ok(()) => {
                info!(path = %path.display(), "downloaded cover");
                CoverImage::Cached(path)
            }
            Err(e) => {
                warn!(%id, error = %e, "cover download failed, using placeholder");
                CoverImage::Placeholder
            }
        }
    }

    fn store(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(path, bytes)
    }
}
