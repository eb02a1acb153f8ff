pub mod artifacts;
pub mod catalog;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod inference;
pub mod models;
pub mod pipeline;
pub mod service;
pub mod trainer;
pub mod utils;

pub use artifacts::{ModelBundle, ModelStore};
pub use catalog::{CatalogApi, CatalogClient, CatalogClientBuilder, CatalogError};
pub use config::{Settings, SettingsBuilder};
pub use error::ModelError;
pub use inference::{GenrePredictor, score};
pub use models::{CorpusRow, MangaId, PredictionResult, TagSet};
pub use service::{GenreService, ServiceError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builder_accessible_from_crate_root() {
        let client = CatalogClientBuilder::new()
            .base_url("http://localhost:1")
            .uploads_url("http://localhost:2")
            .build();
        assert!(client.is_ok());
    }

    #[test]
    fn types_accessible_from_crate_root() {
        let id = MangaId::new("abc-123");
        assert_eq!(id.as_str(), "abc-123");

        let tags: TagSet = ["Action".to_string()].into_iter().collect();
        assert_eq!(score(&tags, &tags), 1.0);

        let result = PredictionResult {
            predicted_tags: tags,
            accuracy: 1.0,
        };
        assert_eq!(result.accuracy, 1.0);

        let err = ModelError::EmptyCorpus;
        assert!(err.to_string().contains("empty corpus"));
    }
}
