use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    /// The API key was missing or refused by the search API
    #[error("Search API rejected the API key: {0}")]
    Auth(String),

    /// The API asked us to slow down (HTTP 429)
    #[error("Search API rate limit hit: {0}")]
    RateLimited(String),

    /// Network failure, timeout or a 5xx response
    #[error("Transient search failure: {0}")]
    Transient(String),

    /// Any other non-success response, e.g. exhausted credits or a bad query
    #[error("Search API refused the query ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Failed to decode search response: {0}")]
    Decode(String),
}

impl SearchError {
    /// Whether another attempt of the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::RateLimited(_) | SearchError::Transient(_))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, SearchError::Auth(_))
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::Decode(err.to_string())
        } else {
            SearchError::Transient(err.to_string())
        }
    }
}

/// Why a candidate page was skipped. Never fatal for the pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionFailure {
    #[error("Candidate {url} is unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Candidate {url} has {words} words, below the floor of {min_words}")]
    TooShort {
        url: String,
        words: usize,
        min_words: usize,
    },

    #[error("Candidate {url} has unsupported content type {content_type}")]
    Unsupported { url: String, content_type: String },

    /// The body was fetched but no text could be pulled out of it
    #[error("Candidate {url} could not be read: {reason}")]
    Unreadable { url: String, reason: String },

    #[error("Candidate {url} declares {bytes} bytes, above the limit of {limit}")]
    TooLarge { url: String, bytes: u64, limit: usize },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Fatal: stops the whole run, nothing further is searched
    #[error("Authentication with the search API failed: {0}")]
    Auth(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An HTTP client could not be constructed. Only raised by the free
    /// `find_reposts`, which builds its own clients.
    #[error("Failed to set up the pipeline: {0}")]
    Setup(String),
}
