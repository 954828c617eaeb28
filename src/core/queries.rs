use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::QueryConfig,
    models::OriginalDocument,
    transformers::text::{is_stopword, sentences, squash_whitespace, tokens},
};

/// Texts with fewer tokens than this do not form a sentence.
const MIN_SENTENCE_TOKENS: usize = 3;

static BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(copyright|©|all rights reserved|cookie|subscribe|newsletter|share this|follow us|read more|privacy policy|sva prava pridržana|kolačić|pretplat|podijeli|pročitaj više|pratite nas)",
    )
    .expect("invalid boilerplate regex")
});

fn is_content_token(token: &str) -> bool {
    token.chars().count() >= 3 && !is_stopword(token) && !token.chars().all(|c| c.is_numeric())
}

fn dedup(queries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .filter(|query| seen.insert(query.clone()))
        .collect()
}

/// Derives search queries from one original document, most distinctive first.
#[derive(Debug, Clone, Default)]
pub struct QueryGenerator {
    config: QueryConfig,
}

impl QueryGenerator {
    pub fn new(config: QueryConfig) -> Self {
        Self { config }
    }

    /// Title, then quoted phrases from the most distinctive sentences, then a
    /// keyword query; deduplicated and capped at `max_queries`.
    pub fn generate(&self, doc: &OriginalDocument, max_queries: usize) -> Vec<String> {
        if max_queries == 0 {
            return vec![];
        }

        let title = squash_whitespace(&doc.title);
        let text = squash_whitespace(&doc.text);

        if tokens(&text).len() < MIN_SENTENCE_TOKENS {
            let fallback = if text.is_empty() { title } else { text };
            return if fallback.is_empty() {
                vec![]
            } else {
                vec![fallback]
            };
        }

        let mut queries = Vec::new();
        if !title.is_empty() {
            queries.push(title);
        }
        queries.extend(self.phrase_queries(&doc.text));
        queries.extend(self.keyword_query(&doc.text));

        let mut queries = dedup(queries);
        queries.truncate(max_queries);
        queries
    }

    /// Quoted fixed-length extracts, one per sentence, ranked by how many
    /// distinct content words the sentence carries.
    fn phrase_queries(&self, text: &str) -> Vec<String> {
        let min_words = self.config.min_sentence_words.max(self.config.phrase_words);

        let mut ranked: Vec<(usize, usize, String)> = sentences(text)
            .into_iter()
            .enumerate()
            .filter(|(_, sentence)| !BOILERPLATE.is_match(sentence))
            .filter_map(|(position, sentence)| {
                let words: Vec<&str> = sentence
                    .split_whitespace()
                    .map(|word| word.trim_matches(|c| c == '"' || c == '“' || c == '”'))
                    .filter(|word| !word.is_empty())
                    .collect();
                if words.len() < min_words {
                    return None;
                }

                let distinct: HashSet<String> = tokens(sentence)
                    .into_iter()
                    .filter(|token| is_content_token(token))
                    .collect();

                let start = (words.len() - self.config.phrase_words) / 2;
                let phrase = words[start..start + self.config.phrase_words].join(" ");
                Some((distinct.len(), position, format!("\"{}\"", phrase)))
            })
            .collect();

        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        ranked.into_iter().map(|(_, _, phrase)| phrase).collect()
    }

    /// The most frequent content words, ties broken by first appearance.
    fn keyword_query(&self, text: &str) -> Option<String> {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        for (position, token) in tokens(text).into_iter().enumerate() {
            if is_content_token(&token) {
                counts.entry(token).or_insert((0, position)).0 += 1;
            }
        }

        let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));

        let keywords: Vec<String> = ranked
            .into_iter()
            .take(self.config.keyword_count)
            .map(|(token, _)| token)
            .collect();

        (keywords.len() >= 2).then(|| keywords.join(" "))
    }
}

/// [`QueryGenerator::generate`] with default settings.
pub fn generate_queries(doc: &OriginalDocument, max_queries: usize) -> Vec<String> {
    QueryGenerator::default().generate(doc, max_queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = "Croatia ran a general government deficit again last year. \
        The budget deficit rose to three percent of GDP in 2023, driven by public sector wages and pension indexation. \
        Revenue from value added tax grew strongly but could not keep pace with spending on subsidies for energy prices. \
        Short one here. \
        Copyright 2024 all rights reserved by the author of this blog and its many contributors.";

    fn article() -> OriginalDocument {
        OriginalDocument::new("Budget deficit in 2023", "https://blog.example/deficit", ARTICLE)
    }

    #[test]
    fn test_title_comes_first() {
        let queries = generate_queries(&article(), 30);
        assert_eq!(queries[0], "Budget deficit in 2023");
    }

    #[test]
    fn test_phrases_are_quoted_and_fixed_length() {
        let queries = generate_queries(&article(), 30);
        let phrases: Vec<&String> = queries.iter().filter(|q| q.starts_with('"')).collect();
        assert_eq!(phrases.len(), 3);
        for phrase in phrases {
            assert!(phrase.ends_with('"'));
            assert_eq!(phrase.trim_matches('"').split_whitespace().count(), 8);
        }
    }

    #[test]
    fn test_boilerplate_and_short_sentences_are_skipped() {
        let queries = generate_queries(&article(), 30);
        assert!(!queries.iter().any(|q| q.contains("rights reserved")));
        assert!(!queries.iter().any(|q| q.contains("Short one")));
    }

    #[test]
    fn test_most_distinctive_sentence_first() {
        let queries = generate_queries(&article(), 30);
        assert_eq!(queries[1], "\"three percent of GDP in 2023, driven by\"");
    }

    #[test]
    fn test_keyword_query_is_last() {
        let queries = generate_queries(&article(), 30);
        let keywords = queries.last().unwrap();
        assert!(!keywords.starts_with('"'));
        assert!(keywords.starts_with("deficit"));
        assert_eq!(keywords.split(' ').count(), 6);
    }

    #[test]
    fn test_capped_at_max_queries() {
        assert_eq!(generate_queries(&article(), 2).len(), 2);
        assert_eq!(generate_queries(&article(), 1), vec!["Budget deficit in 2023"]);
        assert!(generate_queries(&article(), 0).is_empty());
    }

    #[test]
    fn test_single_word_falls_back_to_one_query() {
        let doc = OriginalDocument::new("A", "https://blog.example/a", "deficit");
        assert_eq!(generate_queries(&doc, 30), vec!["deficit"]);

        let doc = OriginalDocument::new("Only a title", "https://blog.example/a", "  ");
        assert_eq!(generate_queries(&doc, 30), vec!["Only a title"]);

        let doc = OriginalDocument::new("", "", "");
        assert!(generate_queries(&doc, 30).is_empty());
    }

    #[test]
    fn test_manual_query_deduplicates() {
        let doc = OriginalDocument::from_manual_query("Leonarda Srdelić Institut za javne financije");
        let queries = generate_queries(&doc, 30);
        assert_eq!(queries[0], "Leonarda Srdelić Institut za javne financije");
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[1], "leonarda srdelić institut javne financije");
    }

    #[test]
    fn test_duplicate_title_and_keywords_collapse() {
        let doc = OriginalDocument::new("deficit budget", "u", "deficit budget deficit budget");
        assert_eq!(generate_queries(&doc, 30), vec!["deficit budget"]);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(generate_queries(&article(), 30), generate_queries(&article(), 30));
    }
}
