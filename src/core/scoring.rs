use std::collections::HashMap;

use crate::{
    config::{ScoringConfig, SimilarityMetric},
    transformers::tokens,
};

fn shingles(tokens: &[String], size: usize) -> HashMap<String, u64> {
    let mut counts = HashMap::new();
    for window in tokens.windows(size) {
        *counts.entry(window.join(" ")).or_insert(0) += 1;
    }
    counts
}

/// Cosine over integer counts; the arithmetic is exact up to the final
/// division so `cosine(a, b) == cosine(b, a)` bit for bit.
fn cosine(a: &HashMap<String, u64>, b: &HashMap<String, u64>) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: u64 = small
        .iter()
        .filter_map(|(shingle, count)| large.get(shingle).map(|other| count * other))
        .sum();
    let norm_a: u64 = a.values().map(|count| count * count).sum();
    let norm_b: u64 = b.values().map(|count| count * count).sum();

    if dot == 0 {
        return 0.0;
    }
    dot as f64 / ((norm_a as f64) * (norm_b as f64)).sqrt()
}

fn jaccard(a: &HashMap<String, u64>, b: &HashMap<String, u64>) -> f64 {
    let shared = a.keys().filter(|shingle| b.contains_key(*shingle)).count();
    let union = a.len() + b.len() - shared;
    if union == 0 {
        return 0.0;
    }
    shared as f64 / union as f64
}

/// Lexical similarity between two texts over word shingles.
#[derive(Debug, Clone)]
pub struct Scorer {
    metric: SimilarityMetric,
    shingle_size: usize,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(&ScoringConfig::default())
    }
}

impl Scorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            metric: config.metric,
            shingle_size: config.shingle_size.max(1),
        }
    }

    /// Similarity in `[0, 1]`: 1.0 for texts that normalize identically, 0.0
    /// when either side has no words.
    pub fn score(&self, original_text: &str, candidate_text: &str) -> f32 {
        let a = tokens(original_text);
        let b = tokens(candidate_text);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        // Short texts still get compared, on the shorter side's length.
        let size = self.shingle_size.min(a.len()).min(b.len());
        let a = shingles(&a, size);
        let b = shingles(&b, size);

        let similarity = match self.metric {
            SimilarityMetric::Cosine => cosine(&a, &b),
            SimilarityMetric::Jaccard => jaccard(&a, &b),
        };
        similarity.clamp(0.0, 1.0) as f32
    }
}

/// [`Scorer::score`] with default settings.
pub fn score(original_text: &str, candidate_text: &str) -> f32 {
    Scorer::default().score(original_text, candidate_text)
}
