//! Query normalization.
//!
//! Matching is case-insensitive on trimmed input; nothing else is rewritten.

/// A query after trimming and lower-casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedQuery {
    /// Nothing left after trimming: rank the whole catalog by popularity
    Empty,
    /// Lower-cased, trimmed query text
    Text(String),
}

impl NormalizedQuery {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            NormalizedQuery::Empty
        } else {
            NormalizedQuery::Text(trimmed.to_lowercase())
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            NormalizedQuery::Empty => None,
            NormalizedQuery::Text(text) => Some(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NormalizedQuery::Empty)
    }
}

impl From<&str> for NormalizedQuery {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}
