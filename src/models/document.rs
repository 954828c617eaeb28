use serde::{Deserialize, Serialize};

/// An article being protected against unauthorized copies.
///
/// In manual-query mode `url` holds the raw query string rather than a link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OriginalDocument {
    pub title: String,
    pub url: String,
    pub text: String,
}

impl OriginalDocument {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            text: text.into(),
        }
    }

    /// Builds the single document used when the user supplies a query by hand.
    pub fn from_manual_query(query: &str) -> Self {
        let query = query.trim();
        Self::new(query, query, query)
    }
}
