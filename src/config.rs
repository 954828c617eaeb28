use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use normalize_path::NormalizePath;
use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};

use crate::cli::CliArgs;

pub const DEFAULT_CONFIG_PATH: &str = "repost-watch.toml";
pub const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

#[derive(
    clap::ValueEnum, strum_macros::Display, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SimilarityMetric {
    /// Cosine over term-frequency vectors of word shingles
    #[default]
    Cosine,
    /// Jaccard over word shingle sets
    Jaccard,
}

#[derive(
    clap::ValueEnum, strum_macros::Display, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

#[derive(Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Serper API key
    pub api_key: String,
    /// Search endpoint, overridable for self-hosted proxies
    pub endpoint: String,
    pub max_results_per_query: usize,
    /// Request timeout in sec
    pub timeout_secs: u64,
    /// Attempts per query for transient failures, first call included
    pub max_attempts: u32,
    /// Base delay of the exponential backoff in ms
    pub backoff_ms: u64,
    /// Minimum delay between two search calls in ms
    pub min_interval_ms: u64,
    /// Max search calls in flight
    pub concurrency: usize,
    /// Country hint passed to the API, e.g. "hr"
    pub gl: Option<String>,
    /// Language hint passed to the API, e.g. "hr"
    pub hl: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: SERPER_ENDPOINT.to_string(),
            max_results_per_query: 15,
            timeout_secs: 20,
            max_attempts: 3,
            backoff_ms: 500,
            min_interval_ms: 200,
            concurrency: 4,
            gl: None,
            hl: None,
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("endpoint", &self.endpoint)
            .field("max_results_per_query", &self.max_results_per_query)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_ms", &self.backoff_ms)
            .field("min_interval_ms", &self.min_interval_ms)
            .field("concurrency", &self.concurrency)
            .field("gl", &self.gl)
            .field("hl", &self.hl)
            .finish()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct QueryConfig {
    pub max_queries_per_post: usize,
    /// Length of the quoted exact-phrase queries
    pub phrase_words: usize,
    /// Sentences shorter than this are not sampled for phrases
    pub min_sentence_words: usize,
    /// Terms in the keyword-combination query
    pub keyword_count: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_queries_per_post: 30,
            phrase_words: 8,
            min_sentence_words: 8,
            keyword_count: 6,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct CandidateConfig {
    /// Pages with fewer words are too short to compare. Lowered to the word
    /// count of the original when that is shorter.
    pub min_words: usize,
    pub timeout_secs: u64,
    /// Max page fetches in flight
    pub concurrency: usize,
    pub user_agent: String,
    /// Bodies are cut off after this many bytes; larger declared sizes are refused
    pub max_body_bytes: usize,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            min_words: 50,
            timeout_secs: 20,
            concurrency: 8,
            user_agent: concat!("repost-watch/", env!("CARGO_PKG_VERSION")).to_string(),
            max_body_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ScoringConfig {
    pub similarity_threshold: f32,
    pub metric: SimilarityMetric,
    /// Words per shingle
    pub shingle_size: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            metric: SimilarityMetric::Cosine,
            shingle_size: 3,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Write results here instead of stdout
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub queries: QueryConfig,
    pub candidates: CandidateConfig,
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.scoring.similarity_threshold) {
            bail!(
                "similarity_threshold must be within [0, 1], got {}",
                self.scoring.similarity_threshold
            );
        }
        if self.search.max_results_per_query == 0 {
            bail!("max_results_per_query must be at least 1");
        }
        if self.queries.max_queries_per_post == 0 {
            bail!("max_queries_per_post must be at least 1");
        }
        if self.search.max_attempts == 0 {
            bail!("max_attempts must be at least 1");
        }
        if self.search.concurrency == 0 || self.candidates.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if self.candidates.max_body_bytes == 0 {
            bail!("max_body_bytes must be at least 1");
        }
        if self.scoring.shingle_size == 0 || self.queries.phrase_words == 0 {
            bail!("shingle_size and phrase_words must be at least 1");
        }
        Ok(())
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    log::info!("Config file found: {}", path.display());
    Ok(match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
        _ => bail!("Cannot identify config file type. Must be .toml, .json or .yaml"),
    })
}

/// Layers defaults, the config file, `RW_*` environment variables and CLI
/// flags, in increasing priority.
pub fn load_config(args: &CliArgs) -> Result<Config> {
    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

    let config_path = PathBuf::from(
        args.config
            .clone()
            .unwrap_or(DEFAULT_CONFIG_PATH.to_string()),
    );

    if config_path.exists() {
        figment = merge_file(figment, &config_path)?;
    } else if config_path.to_str() != Some(DEFAULT_CONFIG_PATH) {
        bail!("Config file not found: {}", config_path.display());
    }

    let mut config: Config = figment
        .merge(Env::prefixed("RW_").split("__"))
        .merge(Serialized::defaults(args.overrides()))
        .extract()?;

    if let Some(path) = config.output.path.take() {
        config.output.path = Some(path.resolve().normalize());
    }

    log::debug!("Loaded config: {:#?}", config);

    config.validate()?;
    Ok(config)
}
