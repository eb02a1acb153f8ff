//! Applies a loaded model bundle to new text.

use tracing::debug;

use super::scoring::score;
use crate::artifacts::ModelBundle;
use crate::error::ModelError;
use crate::models::{PredictionResult, TagSet};

/// Predicts genre tags from a title and synopsis.
///
/// Holds one immutable [`ModelBundle`]; nothing is refit at inference time.
#[derive(Debug, Clone)]
pub struct GenrePredictor {
    bundle: ModelBundle,
}

impl GenrePredictor {
    pub fn new(bundle: ModelBundle) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Tags whose decision function fires for `title` + `synopsis`.
    ///
    /// Returns an empty set when no label fires.
    pub fn predict(&self, title: &str, synopsis: &str) -> Result<TagSet, ModelError> {
        let text = format!("{} {}", title, synopsis);
        let features = self.bundle.encoders.transform(&text);
        let decisions = self.bundle.classifier.predict(&features)?;
        let tags = self.bundle.encoders.inverse_transform_labels(&decisions)?;
        debug!(features = features.nnz(), predicted = tags.len(), "predicted tags");
        Ok(tags)
    }

    /// Predicts and scores the result against `actual`.
    pub fn evaluate(
        &self,
        title: &str,
        synopsis: &str,
        actual: &TagSet,
    ) -> Result<PredictionResult, ModelError> {
        let predicted_tags = self.predict(title, synopsis)?;
        let accuracy = score(&predicted_tags, actual);
        Ok(PredictionResult {
            predicted_tags,
            accuracy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{FittedEncoderPair, VectorizerConfig};
    use crate::models::CorpusRow;
    use crate::trainer::{LogisticOptions, MultiLabelClassifier};

    fn predictor() -> GenrePredictor {
        let rows: Vec<CorpusRow> = [
            ("Mecha Front", "giant robots at war", "Mecha"),
            ("Steel Titans", "robots pilots and war", "Mecha"),
            ("Cafe Hearts", "sweet romance in a cafe", "Romance"),
            ("Spring Letters", "romance and first love", "Romance"),
        ]
        .iter()
        .map(|(title, synopsis, tag)| CorpusRow {
            title_primary: title.to_string(),
            title_secondary: String::new(),
            synopsis: synopsis.to_string(),
            tags: [tag.to_string()].into_iter().collect(),
            image_ref: None,
        })
        .collect();
        let encoders = FittedEncoderPair::fit(&rows, VectorizerConfig::default()).unwrap();
        let (x, y) = encoders.encode_rows(&rows);
        let options = LogisticOptions {
            c: 100.0,
            ..LogisticOptions::default()
        };
        let classifier = MultiLabelClassifier::fit(&x, &y, &options).unwrap();
        GenrePredictor::new(ModelBundle::new(encoders, classifier).unwrap())
    }

    #[test]
    fn predicts_the_matching_genre() {
        let tags = predictor().predict("Robot War", "pilots of giant robots").unwrap();
        assert!(tags.contains("Mecha"));
        assert!(!tags.contains("Romance"));
    }

    #[test]
    fn evaluate_scores_against_actual_tags() {
        let actual: TagSet = ["Romance".to_string(), "Comedy".to_string()].into_iter().collect();
        let result = predictor()
            .evaluate("Love Cafe", "a sweet romance and first love", &actual)
            .unwrap();
        assert!(result.predicted_tags.contains("Romance"));
        assert_eq!(result.accuracy, 0.5);
    }

    #[test]
    fn prediction_is_deterministic() {
        let p = predictor();
        assert_eq!(
            p.predict("Steel", "robots").unwrap(),
            p.predict("Steel", "robots").unwrap()
        );
    }
}
