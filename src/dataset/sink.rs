//! Delimited corpus file: one row per catalog item.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::DatasetError;
use crate::models::{CorpusRow, TagSet};

/// Column order of the corpus file.
pub const HEADER: [&str; 5] = ["title_ja", "title_en", "tags", "cover_image_path", "description"];

/// Joins individual tag names inside the `tags` column.
pub const TAG_SEPARATOR: char = '|';

/// Replaces the field separator and line breaks with spaces and trims.
///
/// ```
/// use mangenre::dataset::neutralize;
///
/// assert_eq!(neutralize(" Love, War\nand Peace "), "Love  War and Peace");
/// ```
pub fn neutralize(text: &str) -> String {
    text.replace([',', '\n', '\r'], " ").trim().to_string()
}

fn join_tags(tags: &TagSet) -> String {
    tags.iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(&TAG_SEPARATOR.to_string())
}

fn split_tags(field: &str) -> TagSet {
    field
        .split(TAG_SEPARATOR)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// Append-only writer for corpus rows.
///
/// Rows are flushed as they are written so an interrupted build leaves a
/// readable file behind.
pub struct CorpusSink {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl CorpusSink {
    /// Creates (or truncates) the sink and writes the header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        ensure_parent(path)?;
        let file = File::create(path)?;
        let mut sink = Self::from_file(file, path);
        sink.writer.write_record(HEADER)?;
        sink.writer.flush()?;
        Ok(sink)
    }

    /// Opens the sink for appending; the header is written only if the file is new or empty.
    pub fn append(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        ensure_parent(path)?;
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;
        let mut sink = Self::from_file(file, path);
        if is_empty {
            sink.writer.write_record(HEADER)?;
            sink.writer.flush()?;
        }
        Ok(sink)
    }

    fn from_file(file: File, path: &Path) -> Self {
        let writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        Self {
            writer,
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one row. Text fields are neutralized; tags are written as-is.
    pub fn write_row(&mut self, row: &CorpusRow) -> Result<(), DatasetError> {
        let image = row
            .image_ref
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.writer.write_record([
            neutralize(&row.title_secondary),
            neutralize(&row.title_primary),
            join_tags(&row.tags),
            image,
            neutralize(&row.synopsis),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
struct SinkRecord {
    #[serde(default)]
    title_ja: String,
    #[serde(default)]
    title_en: String,
    #[serde(default)]
    tags: String,
    #[serde(default)]
    cover_image_path: String,
    #[serde(default)]
    description: String,
}

impl From<SinkRecord> for CorpusRow {
    fn from(record: SinkRecord) -> Self {
        CorpusRow {
            title_primary: record.title_en,
            title_secondary: record.title_ja,
            synopsis: record.description,
            tags: split_tags(&record.tags),
            image_ref: Some(record.cover_image_path)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Reads a corpus file back, keeping only rows usable for training.
///
/// Rows with an empty tag set or no title are dropped.
pub fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<CorpusRow>, DatasetError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<SinkRecord>() {
        let row = CorpusRow::from(record?);
        if row.is_trainable() {
            rows.push(row);
        }
    }
    Ok(rows)
}
