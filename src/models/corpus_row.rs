use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A set of genre tag names. Ordered so iteration and display are stable.
pub type TagSet = BTreeSet<String>;

/// One catalog item as written to the corpus sink.
///
/// `title_primary` holds the English title and `title_secondary` the
/// configured second-locale title (Japanese by default).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRow {
    pub title_primary: String,
    pub title_secondary: String,
    pub synopsis: String,
    pub tags: TagSet,
    pub image_ref: Option<PathBuf>,
}

impl CorpusRow {
    /// Returns true if at least one title field carries text.
    pub fn has_title(&self) -> bool {
        !self.title_primary.trim().is_empty() || !self.title_secondary.trim().is_empty()
    }

    /// Rows without tags carry no supervision signal and are excluded from training.
    pub fn is_trainable(&self) -> bool {
        self.has_title() && !self.tags.is_empty()
    }

    /// Whitespace-joined title fields and synopsis, skipping empty parts.
    ///
    /// ```
    /// use mangenre::models::CorpusRow;
    ///
    /// let row = CorpusRow {
    ///     title_primary: "Blue Flag".to_string(),
    ///     title_secondary: String::new(),
    ///     synopsis: "A love triangle.".to_string(),
    ///     tags: Default::default(),
    ///     image_ref: None,
    /// };
    /// assert_eq!(row.text(), "Blue Flag A love triangle.");
    /// ```
    pub fn text(&self) -> String {
        [
            self.title_primary.as_str(),
            self.title_secondary.as_str(),
            self.synopsis.as_str(),
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}
