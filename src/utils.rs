//! Shared helpers for the command-line interface.

use std::path::Path;

use anyhow::{Context, Result};

use crate::models::TagSet;

/// Ensures the parent directory of `path` exists.
///
/// Creates the directory structure if it doesn't exist using `create_dir_all`.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_parent_directory(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Renders a tag set as a comma-separated list, or `(none)` when empty.
///
/// # Examples
///
/// ```
/// use mangenre::models::TagSet;
/// use mangenre::utils::format_tags;
///
/// let tags: TagSet = ["Romance", "Drama"].iter().map(|s| s.to_string()).collect();
/// assert_eq!(format_tags(&tags), "Drama, Romance");
/// assert_eq!(format_tags(&TagSet::new()), "(none)");
/// ```
pub fn format_tags(tags: &TagSet) -> String {
    if tags.is_empty() {
        return "(none)".to_string();
    }
    tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Formats a ratio in `[0, 1]` as a percentage with one decimal.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}
