use std::{collections::HashSet, sync::Arc};

use futures::{StreamExt, TryStreamExt, stream};

use crate::{
    config::Config,
    core::{
        queries::QueryGenerator,
        resolver::{CandidateCache, CandidateResolver},
        scoring::Scorer,
    },
    engines::{BoxedWebSearch, SearchClient, Serper},
    error::{PipelineError, SearchError},
    models::{Finding, OriginalDocument, SearchResult},
    providers::{HtmlExtractor, TextExtractor},
    transformers::{canonicalize, text::word_count},
};

/// Documents processed at the same time. Search and fetch load is bounded
/// separately by their own limits.
const DOCUMENT_CONCURRENCY: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineParams {
    pub similarity_threshold: f32,
    pub max_results_per_query: usize,
    pub max_queries_per_post: usize,
}

impl PipelineParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            similarity_threshold: config.scoring.similarity_threshold,
            max_results_per_query: config.search.max_results_per_query,
            max_queries_per_post: config.queries.max_queries_per_post,
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(PipelineError::InvalidParameter(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.max_results_per_query == 0 || self.max_queries_per_post == 0 {
            return Err(PipelineError::InvalidParameter(
                "max_results_per_query and max_queries_per_post must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A search result kept for scoring, tagged with the first query that surfaced it.
struct Hit {
    query_index: usize,
    result: SearchResult,
}

/// Finds pages that republish the given documents.
pub struct RepostFinder {
    search: SearchClient,
    resolver: CandidateResolver,
    queries: QueryGenerator,
    scorer: Scorer,
    search_concurrency: usize,
    candidate_concurrency: usize,
}

impl RepostFinder {
    pub fn new(engine: BoxedWebSearch, extractor: Arc<dyn TextExtractor>, config: &Config) -> Self {
        Self {
            search: SearchClient::new(engine, &config.search),
            resolver: CandidateResolver::new(extractor, config.candidates.min_words),
            queries: QueryGenerator::new(config.queries.clone()),
            scorer: Scorer::new(&config.scoring),
            search_concurrency: config.search.concurrency.max(1),
            candidate_concurrency: config.candidates.concurrency.max(1),
        }
    }

    /// Runs the whole pipeline and returns findings sorted by descending
    /// similarity.
    ///
    /// Only an authentication failure aborts the run; failed queries and
    /// unreadable candidates just yield fewer findings. Dropping the returned
    /// future aborts every request in flight.
    pub async fn find_reposts(
        &self,
        docs: &[OriginalDocument],
        params: &PipelineParams,
    ) -> Result<Vec<Finding>, PipelineError> {
        params.validate()?;
        self.search
            .check_credentials()
            .map_err(|e| PipelineError::Auth(e.to_string()))?;

        log::info!(
            "Looking for reposts of {} documents via {}",
            docs.len(),
            self.search.engine_name()
        );

        let cache = CandidateCache::new();
        let per_document: Vec<Vec<Finding>> = stream::iter(docs)
            .map(|doc| self.process_document(doc, params, &cache))
            .buffered(DOCUMENT_CONCURRENCY)
            .try_collect()
            .await?;

        let mut findings: Vec<Finding> = per_document.into_iter().flatten().collect();
        findings.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

        log::info!(
            "Found {} reposts, fetched {} distinct candidates",
            findings.len(),
            cache.fetches()
        );

        Ok(findings)
    }

    async fn process_document(
        &self,
        doc: &OriginalDocument,
        params: &PipelineParams,
        cache: &CandidateCache,
    ) -> Result<Vec<Finding>, PipelineError> {
        let queries = self.queries.generate(doc, params.max_queries_per_post);
        if queries.is_empty() {
            log::warn!("No queries for {:?}, skipping it", doc.title);
            return Ok(vec![]);
        }
        log::info!("{} queries for {:?}", queries.len(), doc.title);

        let hits = self
            .search_all(doc, &queries, params.max_results_per_query)
            .await?;
        log::info!("{} distinct candidates for {:?}", hits.len(), doc.title);

        Ok(self
            .score_hits(doc, &queries, hits, params.similarity_threshold, cache)
            .await)
    }

    /// Searches every query and unions the results by canonical url, leaving
    /// out the document's own url.
    async fn search_all(
        &self,
        doc: &OriginalDocument,
        queries: &[String],
        max_results: usize,
    ) -> Result<Vec<Hit>, PipelineError> {
        let mut per_query: Vec<(usize, Vec<SearchResult>)> =
            stream::iter(queries.iter().enumerate())
                .map(|(index, query)| async move {
                    match self.search.search(query, max_results).await {
                        Ok(results) => Ok((index, results)),
                        Err(SearchError::Auth(message)) => Err(PipelineError::Auth(message)),
                        Err(err) => {
                            log::warn!("Skipping query {:?}: {}", query, err);
                            Ok((index, vec![]))
                        }
                    }
                })
                .buffer_unordered(self.search_concurrency)
                .try_collect()
                .await?;
        per_query.sort_by_key(|(index, _)| *index);

        let own_url = canonicalize(&doc.url);
        let mut seen = HashSet::new();
        let mut hits = Vec::new();
        for (query_index, results) in per_query {
            for result in results {
                let key = canonicalize(&result.url);
                if key == own_url || !seen.insert(key) {
                    continue;
                }
                hits.push(Hit {
                    query_index,
                    result,
                });
            }
        }

        Ok(hits)
    }

    async fn score_hits(
        &self,
        doc: &OriginalDocument,
        queries: &[String],
        hits: Vec<Hit>,
        threshold: f32,
        cache: &CandidateCache,
    ) -> Vec<Finding> {
        let original_words = word_count(&doc.text);
        let scored: Vec<Option<(Hit, f32)>> = stream::iter(hits)
            .map(|hit| async move {
                match self
                    .resolver
                    .resolve(&hit.result.url, original_words, cache)
                    .await
                {
                    Ok(candidate) => {
                        let similarity = self.scorer.score(&doc.text, &candidate.text);
                        log::debug!("{} scored {:.3}", hit.result.url, similarity);
                        Some((hit, similarity))
                    }
                    Err(failure) => {
                        log::info!("Skipping candidate: {}", failure);
                        None
                    }
                }
            })
            .buffer_unordered(self.candidate_concurrency)
            .collect()
            .await;

        let mut findings: Vec<Finding> = scored
            .into_iter()
            .flatten()
            .filter(|(_, similarity)| *similarity >= threshold)
            .map(|(hit, similarity)| Finding {
                source_title: doc.title.clone(),
                source_url: doc.url.clone(),
                found_title: if hit.result.title.trim().is_empty() {
                    hit.result.url.clone()
                } else {
                    hit.result.title
                },
                found_url: hit.result.url,
                similarity,
                matched_query: queries[hit.query_index].clone(),
            })
            .collect();

        findings.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.found_url.cmp(&b.found_url))
        });
        findings
    }
}

/// Searches the web for reposts of `docs` with Serper and plain HTML
/// extraction, all other settings at their defaults.
pub async fn find_reposts(
    docs: &[OriginalDocument],
    api_key: &str,
    similarity_threshold: f32,
    max_results_per_query: usize,
    max_queries_per_post: usize,
) -> Result<Vec<Finding>, PipelineError> {
    let mut config = Config::default();
    config.search.api_key = api_key.to_string();

    let engine = Serper::new(&config.search).map_err(|e| PipelineError::Setup(e.to_string()))?;
    let extractor =
        HtmlExtractor::new(&config.candidates).map_err(|e| PipelineError::Setup(e.to_string()))?;

    let params = PipelineParams {
        similarity_threshold,
        max_results_per_query,
        max_queries_per_post,
    };

    RepostFinder::new(Arc::new(engine), Arc::new(extractor), &config)
        .find_reposts(docs, &params)
        .await
}
