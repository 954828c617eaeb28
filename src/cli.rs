use std::path::PathBuf;

use clap::Parser;
use serde_json::{Map, Value, json};

use crate::config::{OutputFormat, SimilarityMetric};

/// Finds pages on the web that republish your articles.
#[derive(Parser, Debug, Default)]
#[command(version, about)]
pub struct CliArgs {
    /// Blog index page listing the articles to track
    #[arg(short, long, env = "RW_BLOG_URL")]
    pub blog_url: Option<String>,

    /// A single article to track
    #[arg(short, long, env = "RW_DOCUMENT_URL", conflicts_with = "blog_url")]
    pub document_url: Option<String>,

    /// Manual query; when set the blog is not fetched
    #[arg(short, long)]
    pub query: Option<String>,

    /// Serper API key (Google Search)
    #[arg(short = 'k', long, env = "SERPER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Similarity threshold (default: 0.5, recommended: 0.3 - 0.9)
    #[arg(short, long, env = "RW_THRESHOLD")]
    pub threshold: Option<f32>,

    /// Max search results per query (default: 15, recommended: 5 - 50)
    #[arg(short = 'n', long, env = "RW_MAX_RESULTS")]
    pub max_results: Option<usize>,

    /// Max search queries per article (default: 30)
    #[arg(long, env = "RW_MAX_QUERIES")]
    pub max_queries: Option<usize>,

    /// Similarity metric (default: cosine)
    #[arg(long, value_enum)]
    pub metric: Option<SimilarityMetric>,

    /// Pages with fewer words are skipped (default: 50)
    #[arg(long, env = "RW_MIN_WORDS")]
    pub min_words: Option<usize>,

    /// Output format (default: table)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write results to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file path (default: "repost-watch.toml")
    #[arg(short, long, env = "RW_CONFIG")]
    pub config: Option<String>,
}

fn insert(sections: &mut Map<String, Value>, section: &str, key: &str, value: Value) {
    let entry = sections
        .entry(section.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(map) = entry {
        map.insert(key.to_string(), value);
    }
}

impl CliArgs {
    /// Only the flags that were actually given, shaped like [`crate::config::Config`].
    pub fn overrides(&self) -> Value {
        let mut sections = Map::new();

        if let Some(api_key) = &self.api_key {
            insert(&mut sections, "search", "api_key", json!(api_key));
        }
        if let Some(max_results) = self.max_results {
            insert(&mut sections, "search", "max_results_per_query", json!(max_results));
        }
        if let Some(max_queries) = self.max_queries {
            insert(&mut sections, "queries", "max_queries_per_post", json!(max_queries));
        }
        if let Some(threshold) = self.threshold {
            insert(&mut sections, "scoring", "similarity_threshold", json!(threshold));
        }
        if let Some(metric) = self.metric {
            insert(&mut sections, "scoring", "metric", json!(metric));
        }
        if let Some(min_words) = self.min_words {
            insert(&mut sections, "candidates", "min_words", json!(min_words));
        }
        if let Some(format) = self.format {
            insert(&mut sections, "output", "format", json!(format));
        }
        if let Some(output) = &self.output {
            insert(&mut sections, "output", "path", json!(output));
        }

        Value::Object(sections)
    }

    /// Warns about values outside the ranges the tool was tuned for.
    pub fn warn_unusual(&self) {
        if let Some(threshold) = self.threshold
            && !(0.3..=0.9).contains(&threshold)
        {
            log::warn!(
                "Similarity threshold {} is outside the recommended range 0.3 - 0.9",
                threshold
            );
        }
        if let Some(max_results) = self.max_results
            && !(5..=50).contains(&max_results)
        {
            log::warn!(
                "{} results per query is outside the recommended range 5 - 50",
                max_results
            );
        }
    }
}
