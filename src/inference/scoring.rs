//! Set-overlap scores between predicted and actual tags.

use crate::models::TagSet;

/// Recall of `actual`: the share of actual tags that were predicted.
///
/// Extra predicted tags are not penalized. An empty `actual` set scores
/// `0.0`.
///
/// # Examples
///
/// ```
/// use mangenre::inference::score;
/// use mangenre::models::TagSet;
///
/// let predicted: TagSet = ["Action", "Comedy"].iter().map(|s| s.to_string()).collect();
/// let actual: TagSet = ["Action", "Drama", "Comedy"].iter().map(|s| s.to_string()).collect();
///
/// // Intersection: {"Action", "Comedy"} = 2 of 3 actual tags
/// assert!((score(&predicted, &actual) - 2.0 / 3.0).abs() < 1e-12);
/// ```
pub fn score(predicted: &TagSet, actual: &TagSet) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    predicted.intersection(actual).count() as f64 / actual.len() as f64
}

/// Share of predicted tags that are actually present.
///
/// An empty `predicted` set scores `0.0`. Reported next to [`score`] so
/// callers can see false positives that recall ignores.
pub fn precision(predicted: &TagSet, actual: &TagSet) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    predicted.intersection(actual).count() as f64 / predicted.len() as f64
}
