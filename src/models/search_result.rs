use serde::{Deserialize, Serialize};

/// One ranked hit returned by a web search engine for a single query.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SearchResult {
    /// Page title as reported by the engine
    pub title: String,
    /// Page url, the natural key of a result
    pub url: String,
    /// Short excerpt shown by the engine
    #[serde(default)]
    pub snippet: String,
}
