use serde::Serialize;

use crate::transformers::text;

/// Extracted plain text of a page surfaced by search.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Candidate {
    pub url: String,
    pub text: String,
}

impl Candidate {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }

    pub fn word_count(&self) -> usize {
        text::word_count(&self.text)
    }
}
