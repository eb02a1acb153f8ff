//! Pages through the catalog listing and writes a labeled corpus.

use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::error::DatasetError;
use super::sink::CorpusSink;
use crate::catalog::{CatalogApi, CoverImage, ImageCache, MangaRecord};
use crate::models::{CorpusRow, MangaId};

/// Knobs for a dataset build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Items requested per listing call.
    pub page_size: usize,
    /// Listing offset to start from; non-zero when resuming.
    pub start_offset: usize,
    /// Pause between per-item operations, separate from retry delays.
    pub pacing: Duration,
    /// Locale used for the secondary title and as synopsis fallback.
    pub fallback_locale: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            page_size: 100,
            start_offset: 0,
            pacing: Duration::from_millis(250),
            fallback_locale: "ja".to_string(),
        }
    }
}

/// Counts reported at the end of a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Items taken from the listing, written or not.
    pub processed: usize,
    pub written: usize,
    /// Items with neither title populated.
    pub skipped: usize,
    /// Covers stored in the image cache.
    pub images: usize,
}

/// Drives a [`CatalogApi`] across pagination into a [`CorpusSink`].
///
/// # Examples
///
/// ```no_run
/// use mangenre::catalog::CatalogClientBuilder;
/// use mangenre::dataset::{CorpusSink, DatasetBuilder};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CatalogClientBuilder::new().build()?;
/// let sink = CorpusSink::create("data/manga_dataset.csv")?;
/// let summary = DatasetBuilder::new(&client, sink).build(500)?;
/// println!("wrote {} rows", summary.written);
/// # Ok(())
/// # }
/// ```
pub struct DatasetBuilder<'a> {
    client: &'a dyn CatalogApi,
    sink: CorpusSink,
    images: Option<ImageCache>,
    options: BuildOptions,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(client: &'a dyn CatalogApi, sink: CorpusSink) -> Self {
        Self {
            client,
            sink,
            images: None,
            options: BuildOptions::default(),
        }
    }

    pub fn options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Enables cover capture into `cache`. Text-only builds leave this unset.
    pub fn images(mut self, cache: ImageCache) -> Self {
        self.images = Some(cache);
        self
    }

    /// Processes up to `target_count` listing items.
    ///
    /// Stops early if the catalog returns an empty page. A failed listing
    /// call aborts the build; rows already written stay in the sink.
    pub fn build(&mut self, target_count: usize) -> Result<BuildSummary, DatasetError> {
        let page_size = self.options.page_size.max(1);
        let mut offset = self.options.start_offset;
        let mut summary = BuildSummary::default();

        info!(target_count, offset, sink = %self.sink.path().display(), "building dataset");

        while summary.processed < target_count {
            let page = self.client.fetch_listing_page(page_size, offset)?;
            if page.data.is_empty() {
                info!(offset, "catalog listing exhausted");
                break;
            }

            for record in &page.data {
                if summary.processed >= target_count {
                    break;
                }
                summary.processed += 1;

                match self.row_from(record) {
                    Some(row) => {
                        if row.image_ref.is_some() {
                            summary.images += 1;
                        }
                        self.sink.write_row(&row)?;
                        summary.written += 1;
                    }
                    None => {
                        debug!(id = %record.id, "skipping item without title");
                        summary.skipped += 1;
                    }
                }

                if summary.processed < target_count {
                    thread::sleep(self.options.pacing);
                }
            }

            offset += page_size;
            info!(
                processed = summary.processed,
                written = summary.written,
                "dataset progress"
            );
        }

        Ok(summary)
    }

    /// Builds a row, or `None` when the item has no usable title.
    fn row_from(&self, record: &MangaRecord) -> Option<CorpusRow> {
        let attributes = &record.attributes;
        let locale = self.options.fallback_locale.as_str();

        let title_primary = attributes.title_in("en").unwrap_or_default().trim().to_string();
        let title_secondary = attributes.title_in(locale).unwrap_or_default().trim().to_string();
        if title_primary.is_empty() && title_secondary.is_empty() {
            return None;
        }

        let synopsis = attributes
            .description
            .get("en")
            .or_else(|| attributes.description.get(locale))
            .unwrap_or_default()
            .to_string();

        let image_ref = self.images.as_ref().and_then(|cache| {
            let id = MangaId::new(record.id.as_str());
            self.capture_cover(cache, &id).path().map(|p| p.to_path_buf())
        });

        Some(CorpusRow {
            title_primary,
            title_secondary,
            synopsis,
            tags: attributes.english_tags().into_iter().collect(),
            image_ref,
        })
    }

    fn capture_cover(&self, cache: &ImageCache, id: &MangaId) -> CoverImage {
        let cached = cache.path_for(id);
        if cached.exists() {
            return CoverImage::Cached(cached);
        }
        let file_name = match self.client.fetch_cover_filename(id) {
            Ok(name) => name,
            Err(e) => {
                warn!(%id, error = %e, "cover lookup failed");
                None
            }
        };
        thread::sleep(self.options.pacing);
        cache.fetch(self.client, id, file_name.as_deref())
    }
}
