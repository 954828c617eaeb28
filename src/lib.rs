//! Finds pages on the web that republish a known set of articles.
//!
//! Queries are derived from each article, run through a web search API, and
//! every result page is fetched and compared against the article text.

pub mod cli;
pub mod config;
pub mod core;
pub mod display;
pub mod engines;
pub mod error;
pub mod models;
pub mod providers;
pub mod transformers;

pub use crate::core::{PipelineParams, RepostFinder, find_reposts};
pub use crate::error::{PipelineError, ResolutionFailure, SearchError};
pub use crate::models::{Candidate, Finding, OriginalDocument, SearchResult};
