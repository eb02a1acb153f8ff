use thiserror::Error;

use crate::catalog::CatalogError;

/// Errors that can occur while building or reading the corpus.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Listing fetch failed after retries.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Filesystem errors on the sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unwritable corpus rows.
    #[error("Corpus format error: {0}")]
    Csv(#[from] csv::Error),
}
