use serde::{Deserialize, Serialize};

/// A page whose text cleared the similarity threshold against an original.
///
/// Flat on purpose: every field maps to one column of the exported table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    pub source_title: String,
    pub source_url: String,
    pub found_title: String,
    pub found_url: String,
    /// Similarity in `[0, 1]`
    pub similarity: f32,
    /// The query that surfaced `found_url`
    pub matched_query: String,
}
