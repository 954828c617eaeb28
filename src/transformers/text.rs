use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?…]+(?:\s+|$)|\n+").expect("invalid sentence regex"));

// English and Croatian, the two languages the tracked blogs are written in.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be",
        "because", "been", "before", "being", "between", "both", "but", "by", "can", "could",
        "did", "do", "does", "doing", "during", "each", "even", "few", "for", "from", "had",
        "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if",
        "in", "into", "is", "it", "its", "just", "more", "most", "much", "my", "no", "nor",
        "not", "now", "of", "off", "on", "once", "one", "only", "or", "other", "our", "out",
        "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the",
        "their", "them", "then", "there", "these", "they", "this", "those", "through", "to",
        "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
        "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your",
        // Croatian
        "ako", "ali", "bi", "bila", "bili", "bilo", "bio", "biti", "bude", "da", "do", "dok",
        "ga", "gdje", "i", "ih", "ili", "iz", "ja", "je", "jer", "jednom", "jesu", "još",
        "ju", "kad", "kada", "kako", "koja", "koje", "koji", "kojih", "kojima", "kojoj",
        "kroz", "li", "me", "među", "mi", "mu", "na", "nad", "nakon", "nam", "ne", "nego",
        "neki", "nije", "niti", "no", "o", "od", "on", "ona", "oni", "ono", "pa", "po",
        "pod", "prema", "pri", "prije", "s", "sa", "samo", "se", "si", "smo", "su", "sve",
        "svi", "ta", "taj", "tako", "također", "te", "ti", "to", "toga", "tom", "u", "uz",
        "vi", "za", "zbog", "što",
    ]
    .into_iter()
    .collect()
});

/// Canonical form used for comparison: lowercase, punctuation folded to
/// spaces, whitespace collapsed. Display text keeps its original casing.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized tokens of `text`, in order.
pub fn tokens(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Splits raw text into trimmed sentences. Terminal punctuation is dropped.
pub fn sentences(text: &str) -> Vec<&str> {
    SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Expects an already normalized token.
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Collapses runs of whitespace without touching case or punctuation.
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
