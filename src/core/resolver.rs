use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::{
    error::ResolutionFailure,
    models::Candidate,
    providers::TextExtractor,
    transformers::canonicalize,
};

type Resolution = Result<Candidate, ResolutionFailure>;

/// Candidates resolved during one pipeline run, keyed by canonical url.
///
/// Concurrent lookups of the same url share a single fetch.
#[derive(Default)]
pub struct CandidateCache {
    entries: DashMap<String, Arc<OnceCell<Resolution>>>,
    fetches: AtomicUsize,
}

impl CandidateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of times the extractor was actually called.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn slot(&self, key: String) -> Arc<OnceCell<Resolution>> {
        self.entries.entry(key).or_default().value().clone()
    }
}

pub struct CandidateResolver {
    extractor: Arc<dyn TextExtractor>,
    min_words: usize,
}

impl CandidateResolver {
    pub fn new(extractor: Arc<dyn TextExtractor>, min_words: usize) -> Self {
        Self {
            extractor,
            min_words,
        }
    }

    /// Resolves `url` for an original of `original_words` words.
    ///
    /// The cache holds what was extracted; the word floor is applied per
    /// original and never drops below one word.
    pub async fn resolve(
        &self,
        url: &str,
        original_words: usize,
        cache: &CandidateCache,
    ) -> Resolution {
        let slot = cache.slot(canonicalize(url));
        let candidate = slot
            .get_or_init(|| async {
                cache.fetches.fetch_add(1, Ordering::SeqCst);
                self.fetch(url).await
            })
            .await
            .clone()?;

        let min_words = self.min_words.min(original_words).max(1);
        let words = candidate.word_count();
        if words < min_words {
            return Err(ResolutionFailure::TooShort {
                url: candidate.url,
                words,
                min_words,
            });
        }

        Ok(candidate)
    }

    async fn fetch(&self, url: &str) -> Resolution {
        log::debug!("Resolving candidate {} via {}", url, self.extractor.name());
        let text = self.extractor.extract(url).await?;
        Ok(Candidate::new(url, text))
    }
}
