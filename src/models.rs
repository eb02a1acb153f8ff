mod corpus_row;
mod ids;
mod prediction;

pub use corpus_row::{CorpusRow, TagSet};
pub use ids::MangaId;
pub use prediction::PredictionResult;
