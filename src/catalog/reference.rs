//! Extraction of item identifiers from user-supplied catalog links.

use std::sync::LazyLock;

use regex::Regex;

use super::client::CatalogError;
use crate::models::MangaId;

static TITLE_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/title/([a-f0-9-]+)").expect("title segment pattern is valid")
});

/// Pulls the item ID out of a `.../title/{id}/...` link.
///
/// No network call is made; a link without the `/title/` segment is an
/// [`CatalogError::InvalidReference`].
///
/// # Examples
///
/// ```
/// use mangenre::catalog::extract_manga_id;
///
/// let id = extract_manga_id("https://mangadex.org/title/abc-123-def/some-name").unwrap();
/// assert_eq!(id.as_str(), "abc-123-def");
///
/// assert!(extract_manga_id("https://mangadex.org/abc-123-def").is_err());
/// ```
pub fn extract_manga_id(link: &str) -> Result<MangaId, CatalogError> {
    TITLE_SEGMENT
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| MangaId::new(m.as_str()))
        .ok_or_else(|| CatalogError::InvalidReference(link.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_after_title_segment() {
        let id = extract_manga_id("https://example.org/title/abc-123-def").unwrap();
        assert_eq!(id.as_str(), "abc-123-def");
    }

    #[test]
    fn stops_at_first_non_hex_character() {
        let id = extract_manga_id(
            "https://mangadex.org/title/a1b2c3d4-0000-4e5f-8a9b-c0d1e2f3a4b5/blue-flag",
        )
        .unwrap();
        assert_eq!(id.as_str(), "a1b2c3d4-0000-4e5f-8a9b-c0d1e2f3a4b5");
    }

    #[test]
    fn link_without_title_segment_is_invalid() {
        let err = extract_manga_id("https://example.org/abc-123-def").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidReference(_)));
    }

    #[test]
    fn empty_input_is_invalid() {
        assert!(matches!(
            extract_manga_id(""),
            Err(CatalogError::InvalidReference(_))
        ));
    }
}
