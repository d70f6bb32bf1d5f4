//! Song metadata shared across lookups, sessions, and replies.

/// Placeholder for catalog fields the provider left out.
pub const UNKNOWN: &str = "Unknown";

/// A resolved song. Built once from a catalog hit and then only cloned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongDescriptor {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub preview_url: Option<String>,
    /// Track page on the catalog's storefront.
    pub canonical_url: Option<String>,
    pub artwork_url: Option<String>,
}

impl SongDescriptor {
    /// "Title by Artist", used in log lines and notices.
    pub fn display(&self) -> String {
        format!("{} by {}", self.title, self.artist)
    }
}

/// Fold a free-text query into a memo key.
///
/// Case-folded and whitespace-collapsed, kept readable so memoized queries
/// can be listed.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
