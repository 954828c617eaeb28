use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{Instant, sleep, sleep_until};

use crate::{config::SearchConfig, error::SearchError, models::SearchResult};

pub mod serper;

pub use serper::Serper;

#[async_trait]
pub trait WebSearch: Send + Sync {
    fn name(&self) -> &'static str;

    /// Local credential check, run once before any query is sent.
    fn check_credentials(&self) -> Result<(), SearchError> {
        Ok(())
    }

    /// One API call for `query`, asking for at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize)
    -> Result<Vec<SearchResult>, SearchError>;

    async fn limited_search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let hits = self.search(query, max_results).await?;
        let total = hits.len();

        let hits: Vec<SearchResult> = hits
            .into_iter()
            .filter(|hit| !hit.url.trim().is_empty())
            .take(max_results)
            .collect();

        log::debug!(
            "{} kept {} of {} hits for {:?}",
            self.name(),
            hits.len(),
            total,
            query
        );

        Ok(hits)
    }
}

pub type BoxedWebSearch = Arc<dyn WebSearch>;

/// Caps concurrent search calls and spaces their start times to respect the
/// API quota.
pub struct Throttle {
    permits: Semaphore,
    min_interval: Duration,
    next_slot: Mutex<Instant>,
}

impl Throttle {
    pub fn new(concurrency: usize, min_interval: Duration) -> Self {
        Self {
            permits: Semaphore::new(concurrency.max(1)),
            min_interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    async fn run<T, F>(&self, call: F) -> Result<T, SearchError>
    where
        F: Future<Output = Result<T, SearchError>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| SearchError::Transient(e.to_string()))?;

        let start_at = {
            let mut next_slot = self.next_slot.lock().await;
            let start_at = (*next_slot).max(Instant::now());
            *next_slot = start_at + self.min_interval;
            start_at
        };
        sleep_until(start_at).await;

        call.await
    }
}

/// Search client used by the pipeline: throttled, retrying transient
/// failures with exponential backoff.
pub struct SearchClient {
    engine: BoxedWebSearch,
    throttle: Throttle,
    max_attempts: u32,
    backoff: Duration,
}

impl SearchClient {
    pub fn new(engine: BoxedWebSearch, config: &SearchConfig) -> Self {
        Self {
            engine,
            throttle: Throttle::new(
                config.concurrency,
                Duration::from_millis(config.min_interval_ms),
            ),
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn check_credentials(&self) -> Result<(), SearchError> {
        self.engine.check_credentials()
    }

    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let mut attempt = 1;
        loop {
            let result = self
                .throttle
                .run(self.engine.limited_search(query, max_results))
                .await;

            match result {
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff * 2u32.saturating_pow(attempt - 1);
                    log::warn!(
                        "Search attempt {}/{} for {:?} failed, retrying in {:?}: {}",
                        attempt,
                        self.max_attempts,
                        query,
                        delay,
                        err
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// In-memory engine: canned hits per query, or scripted failures.
    #[derive(Default)]
    pub(crate) struct FakeSearch {
        pub hits: HashMap<String, Vec<SearchResult>>,
        pub failures: Mutex<HashMap<String, Vec<SearchError>>>,
        pub calls: AtomicUsize,
        pub reject_credentials: bool,
    }

    impl FakeSearch {
        pub(crate) fn with_hit(mut self, query: &str, url: &str, title: &str) -> Self {
            self.hits
                .entry(query.to_string())
                .or_default()
                .push(SearchResult {
                    title: title.to_string(),
                    url: url.to_string(),
                    snippet: String::new(),
                });
            self
        }

        pub(crate) fn with_hit_everywhere(mut self, queries: &[String], url: &str) -> Self {
            for query in queries {
                self = self.with_hit(query, url, "Copied");
            }
            self
        }

        pub(crate) async fn fail(&self, query: &str, errors: Vec<SearchError>) {
            self.failures
                .lock()
                .await
                .insert(query.to_string(), errors);
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WebSearch for FakeSearch {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn check_credentials(&self) -> Result<(), SearchError> {
            if self.reject_credentials {
                return Err(SearchError::Auth("no API key configured".to_string()));
            }
            Ok(())
        }

        async fn search(
            &self,
            query: &str,
            _max_results: usize,
        ) -> Result<Vec<SearchResult>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(errors) = self.failures.lock().await.get_mut(query)
                && !errors.is_empty()
            {
                return Err(errors.remove(0));
            }
            Ok(self.hits.get(query).cloned().unwrap_or_default())
        }
    }

    fn fast_config() -> SearchConfig {
        SearchConfig {
            api_key: "key".to_string(),
            backoff_ms: 1,
            min_interval_ms: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_limited_search_caps_results() {
        let mut engine = FakeSearch::default();
        for i in 0..10 {
            engine = engine.with_hit("q", &format!("https://site.example/{i}"), "t");
        }
        engine = engine.with_hit("q", "  ", "blank url");

        let hits = engine.limited_search("q", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].url, "https://site.example/0");
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let engine = Arc::new(FakeSearch::default().with_hit("q", "https://a.example", "A"));
        engine
            .fail(
                "q",
                vec![
                    SearchError::Transient("timeout".to_string()),
                    SearchError::RateLimited("429".to_string()),
                ],
            )
            .await;

        let client = SearchClient::new(engine.clone(), &fast_config());
        let hits = client.search("q", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(engine.calls(), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let engine = Arc::new(FakeSearch::default());
        engine
            .fail(
                "q",
                (0..5)
                    .map(|_| SearchError::Transient("down".to_string()))
                    .collect(),
            )
            .await;

        let client = SearchClient::new(engine.clone(), &fast_config());
        let err = client.search("q", 10).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(engine.calls(), 3);
    }

    #[tokio::test]
    async fn test_auth_error_is_not_retried() {
        let engine = Arc::new(FakeSearch::default());
        engine
            .fail("q", vec![SearchError::Auth("bad key".to_string())])
            .await;

        let client = SearchClient::new(engine.clone(), &fast_config());
        let err = client.search("q", 10).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_throttle_spaces_calls() {
        let throttle = Throttle::new(4, Duration::from_millis(20));
        let started = Instant::now();
        for _ in 0..3 {
            throttle.run(async { Ok::<_, SearchError>(()) }).await.unwrap();
        }
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
