//! Multi-label binarization of tag sets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ModelError;
use crate::models::TagSet;

/// One row of the label matrix: `true` where the tag is present.
pub type LabelVector = Vec<bool>;

/// Maps tag names to fixed label columns and back.
///
/// Columns are the distinct tags seen at fit time in lexicographic order.
///
/// # Examples
///
/// ```
/// use mangenre::encoder::LabelBinarizer;
/// use mangenre::models::TagSet;
///
/// let sets: Vec<TagSet> = vec![
///     ["Action", "Comedy"].iter().map(|s| s.to_string()).collect(),
///     ["Drama"].iter().map(|s| s.to_string()).collect(),
/// ];
/// let binarizer = LabelBinarizer::fit(&sets).unwrap();
/// assert_eq!(binarizer.classes(), &["Action", "Comedy", "Drama"]);
///
/// let rows = binarizer.transform_labels(&sets);
/// assert_eq!(rows[0], vec![true, true, false]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredClasses")]
pub struct LabelBinarizer {
    classes: Vec<String>,
    #[serde(skip)]
    index: BTreeMap<String, usize>,
}

#[derive(Deserialize)]
struct StoredClasses {
    classes: Vec<String>,
}

impl From<StoredClasses> for LabelBinarizer {
    fn from(stored: StoredClasses) -> Self {
        Self::from_classes(stored.classes)
    }
}

impl LabelBinarizer {
    pub fn fit(tag_sets: &[TagSet]) -> Result<Self, ModelError> {
        let classes: TagSet = tag_sets.iter().flatten().cloned().collect();
        if classes.is_empty() {
            return Err(ModelError::EmptyCorpus);
        }
        Ok(Self::from_classes(classes.into_iter().collect()))
    }

    fn from_classes(classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { classes, index }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Encodes one tag set. Tags unseen at fit time are ignored.
    pub fn transform(&self, tags: &TagSet) -> LabelVector {
        let mut row = vec![false; self.len()];
        for tag in tags {
            match self.index.get(tag) {
                Some(&i) => row[i] = true,
                None => warn!(%tag, "ignoring tag unknown to the binarizer"),
            }
        }
        row
    }

    pub fn transform_labels(&self, tag_sets: &[TagSet]) -> Vec<LabelVector> {
        tag_sets.iter().map(|tags| self.transform(tags)).collect()
    }

    /// Decodes one label row back into tag names.
    pub fn inverse_transform_labels(&self, row: &[bool]) -> Result<TagSet, ModelError> {
        if row.len() != self.len() {
            return Err(ModelError::mismatch("label width", self.len(), row.len()));
        }
        Ok(row
            .iter()
            .zip(&self.classes)
            .filter(|(on, _)| **on)
            .map(|(_, class)| class.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tags: &[&str]) -> TagSet {
        tags.iter().map(|t| t.to_string()).collect()
    }

    fn fitted() -> LabelBinarizer {
        LabelBinarizer::fit(&[set(&["Romance", "Drama"]), set(&["Action"])]).unwrap()
    }

    #[test]
    fn fit_without_any_tags_fails() {
        assert!(matches!(
            LabelBinarizer::fit(&[set(&[])]),
            Err(ModelError::EmptyCorpus)
        ));
    }

    #[test]
    fn round_trip_preserves_rows() {
        let b = fitted();
        for tags in [set(&["Drama"]), set(&["Action", "Romance"]), set(&[])] {
            let row = b.transform(&tags);
            let back = b.inverse_transform_labels(&row).unwrap();
            assert_eq!(b.transform(&back), row);
            assert_eq!(back, tags);
        }
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let b = fitted();
        assert_eq!(b.transform(&set(&["Isekai", "Action"])), vec![true, false, false]);
    }

    #[test]
    fn wrong_width_is_an_encoder_mismatch() {
        let err = fitted().inverse_transform_labels(&[true]).unwrap_err();
        assert!(matches!(err, ModelError::EncoderMismatch { .. }));
    }

    #[test]
    fn serde_round_trip_restores_lookup() {
        let b = fitted();
        let json = serde_json::to_string(&b).unwrap();
        let restored: LabelBinarizer = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, b);
        assert_eq!(restored.transform(&set(&["Drama"])), b.transform(&set(&["Drama"])));
    }
}
