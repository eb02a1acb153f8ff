use thiserror::Error;
use tracing::info;

use crate::catalog::{CatalogApi, CatalogError, CoverImage, ImageCache, extract_manga_id};
use crate::error::ModelError;
use crate::inference::{GenrePredictor, precision};
use crate::models::{MangaId, PredictionResult, TagSet};

/// Errors surfaced by a lookup, with text suitable for end users.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ServiceError {
    /// True when the input link, not the system, is at fault.
    pub fn is_user_error(&self) -> bool {
        matches!(self, ServiceError::Catalog(CatalogError::InvalidReference(_)))
    }

    /// Message shown to the person who submitted the link.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Catalog(CatalogError::InvalidReference(_)) => {
                "Invalid MangaDex URL. Please provide a link of the form https://mangadex.org/title/<id>."
                    .to_string()
            }
            ServiceError::Catalog(CatalogError::DataShape { .. }) => {
                "Could not use this item: it lacks a title or description.".to_string()
            }
            ServiceError::Catalog(e) if e.is_remote() => {
                "Could not reach MangaDex. Please try again later.".to_string()
            }
            ServiceError::Catalog(e) => format!("Catalog error: {}", e),
            ServiceError::Model(ModelError::ArtifactMissing(_)) => {
                "No trained model found. Run the train command first.".to_string()
            }
            ServiceError::Model(e) => format!("Model error: {}", e),
        }
    }
}

/// Everything shown for one looked-up item.
#[derive(Debug, Clone)]
pub struct LookupReport {
    pub id: MangaId,
    pub title: String,
    pub actual_tags: TagSet,
    pub prediction: PredictionResult,
    /// Share of predicted tags that are correct; not part of the score.
    pub precision: f64,
    pub cover: CoverImage,
}

/// Link-to-prediction service used by the CLI.
///
/// Owns a catalog client, a predictor loaded once per session and the
/// cover cache. Each [`lookup`](GenreService::lookup) runs: extract id,
/// fetch metadata, predict, score, fetch cover.
///
/// # Examples
///
/// ```no_run
/// use mangenre::artifacts::ModelStore;
/// use mangenre::catalog::{CatalogClientBuilder, ImageCache};
/// use mangenre::inference::GenrePredictor;
/// use mangenre::service::GenreService;
///
/// # fn main() -> anyhow::Result<()> {
/// let client = CatalogClientBuilder::new().build()?;
/// let predictor = GenrePredictor::new(ModelStore::new("models").load()?);
/// let service = GenreService::new(client, predictor, ImageCache::new("covers").thumbnails());
///
/// let report = service.lookup("https://mangadex.org/title/abc-123-def")?;
/// println!("{:?} scored {:.2}", report.prediction.predicted_tags, report.prediction.accuracy);
/// # Ok(())
/// # }
/// ```
pub struct GenreService<C> {
    client: C,
    predictor: GenrePredictor,
    covers: ImageCache,
}

impl<C: CatalogApi> GenreService<C> {
    pub fn new(client: C, predictor: GenrePredictor, covers: ImageCache) -> Self {
        Self {
            client,
            predictor,
            covers,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn lookup(&self, link: &str) -> Result<LookupReport, ServiceError> {
        let id = extract_manga_id(link)?;
        let metadata = self.client.fetch_item_metadata(&id)?;

        let prediction =
            self.predictor
                .evaluate(&metadata.title, &metadata.synopsis, &metadata.tags)?;
        let precision = precision(&prediction.predicted_tags, &metadata.tags);
        let cover = self
            .covers
            .fetch(&self.client, &id, metadata.cover_file.as_deref());

        info!(
            %id,
            predicted = prediction.predicted_tags.len(),
            actual = metadata.tags.len(),
            accuracy = prediction.accuracy,
            "lookup complete"
        );

        Ok(LookupReport {
            id,
            title: metadata.title,
            actual_tags: metadata.tags,
            prediction,
            precision,
            cover,
        })
    }
}
