pub mod candidate;
pub mod document;
pub mod finding;
pub mod search_result;

pub use candidate::Candidate;
pub use document::OriginalDocument;
pub use finding::Finding;
pub use search_result::SearchResult;
