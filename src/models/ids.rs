use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a catalog item.
///
/// The remote catalog uses UUID-shaped strings; the wrapper keeps them from
/// being mixed up with file names or tag names in function signatures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MangaId(String);

impl MangaId {
    /// Creates a new item ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying ID value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MangaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manga_id_serializes_as_raw_string() {
        let id = MangaId::new("abc-123-def");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""abc-123-def""#);

        let deserialized: MangaId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn manga_id_displays_raw_value() {
        assert_eq!(MangaId::new("abc").to_string(), "abc");
    }
}
