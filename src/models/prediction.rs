use serde::Serialize;

use super::TagSet;

/// Outcome of one inference request checked against catalog ground truth.
///
/// `accuracy` is the recall of the actual tag set; see
/// [`crate::inference::score`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub predicted_tags: TagSet,
    pub accuracy: f64,
}
