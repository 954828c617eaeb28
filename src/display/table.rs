use crate::models::{Finding, OriginalDocument};
use crate::transformers::text::word_count;

const MAX_TITLE: usize = 48;

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

pub fn format(findings: &[Finding]) -> String {
    let mut ret = String::new();

    for finding in findings {
        ret.push_str(&format!(
            "{:>5.1}%  {}\n        found: {} ({})\n        query: {}\n",
            finding.similarity * 100.0,
            truncate(&finding.source_title, MAX_TITLE),
            truncate(&finding.found_title, MAX_TITLE),
            finding.found_url,
            finding.matched_query
        ));
    }

    ret
}

/// One line per tracked document.
pub fn documents(docs: &[OriginalDocument]) -> String {
    docs.iter()
        .map(|doc| {
            format!(
                "* {} <{}> ({} words)",
                truncate(&doc.title, MAX_TITLE),
                doc.url,
                word_count(&doc.text)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_table_line() {
        let findings = vec![Finding {
            source_title: "A".to_string(),
            source_url: "https://blog.example/a".to_string(),
            found_title: "Copy".to_string(),
            found_url: "https://copy.example/a".to_string(),
            similarity: 0.5,
            matched_query: "A".to_string(),
        }];
        assert_eq!(
            format(&findings),
            " 50.0%  A\n        found: Copy (https://copy.example/a)\n        query: A\n"
        );
    }

    #[test]
    fn test_documents() {
        let docs = vec![OriginalDocument::new("A", "https://blog.example/a", "one two three")];
        assert_eq!(documents(&docs), "* A <https://blog.example/a> (3 words)");
    }
}
