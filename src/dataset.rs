//! Corpus assembly from the remote catalog.
//!
//! [`DatasetBuilder`] walks the paginated listing and writes one
//! [`CorpusRow`](crate::models::CorpusRow) per titled item into a
//! [`CorpusSink`]; [`load_corpus`] reads the file back for training.

mod builder;
mod error;
mod sink;

pub use builder::{BuildOptions, BuildSummary, DatasetBuilder};
pub use error::DatasetError;
pub use sink::{CorpusSink, HEADER, TAG_SEPARATOR, load_corpus, neutralize};
