//! Text and label encoders fitted on the training corpus.
//!
//! [`FittedEncoderPair`] couples a [`TfidfVectorizer`] with a
//! [`LabelBinarizer`] so training and inference always share the same
//! feature and label columns.
mod binarizer;
mod normalizer;
mod sparse;
mod stop_words;
mod tfidf;

pub use binarizer::{LabelBinarizer, LabelVector};
pub use normalizer::TextNormalizer;
pub use sparse::SparseVector;
pub use stop_words::is_stop_word;
pub use tfidf::{TfidfVectorizer, VectorizerConfig};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ModelError;
use crate::models::{CorpusRow, TagSet};

/// A vectorizer and binarizer fitted together on one corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedEncoderPair {
    pub vectorizer: TfidfVectorizer,
    pub binarizer: LabelBinarizer,
}

impl FittedEncoderPair {
    /// Fits both encoders on `rows`; row text comes from [`CorpusRow::text`].
    pub fn fit(rows: &[CorpusRow], config: VectorizerConfig) -> Result<Self, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyCorpus);
        }
        let texts: Vec<String> = rows.iter().map(CorpusRow::text).collect();
        let tag_sets: Vec<TagSet> = rows.iter().map(|row| row.tags.clone()).collect();

        let vectorizer = TfidfVectorizer::fit(&texts, config)?;
        let binarizer = LabelBinarizer::fit(&tag_sets)?;
        info!(
            rows = rows.len(),
            features = vectorizer.dim(),
            labels = binarizer.len(),
            "fitted encoders"
        );
        Ok(Self {
            vectorizer,
            binarizer,
        })
    }

    pub fn n_features(&self) -> usize {
        self.vectorizer.dim()
    }

    pub fn n_labels(&self) -> usize {
        self.binarizer.len()
    }

    pub fn transform(&self, text: &str) -> SparseVector {
        self.vectorizer.transform(text)
    }

    pub fn transform_labels(&self, tag_sets: &[TagSet]) -> Vec<LabelVector> {
        self.binarizer.transform_labels(tag_sets)
    }

    pub fn inverse_transform_labels(&self, row: &[bool]) -> Result<TagSet, ModelError> {
        self.binarizer.inverse_transform_labels(row)
    }

    /// Feature and label matrices for `rows`, in row order.
    pub fn encode_rows(&self, rows: &[CorpusRow]) -> (Vec<SparseVector>, Vec<LabelVector>) {
        let features = rows.iter().map(|row| self.transform(&row.text())).collect();
        let tag_sets: Vec<TagSet> = rows.iter().map(|row| row.tags.clone()).collect();
        (features, self.transform_labels(&tag_sets))
    }
}
