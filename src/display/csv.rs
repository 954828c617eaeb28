use crate::models::Finding;

const HEADER: [&str; 6] = [
    "source_title",
    "source_url",
    "found_title",
    "found_url",
    "similarity",
    "matched_query",
];

/// Spreadsheets need the BOM to pick UTF-8 for non-ASCII titles.
const BOM: char = '\u{feff}';

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn format(findings: &[Finding]) -> String {
    let mut ret = String::new();
    ret.push(BOM);
    ret.push_str(&HEADER.join(","));
    ret.push_str("\r\n");

    for finding in findings {
        let similarity = format!("{:.4}", finding.similarity);
        let row = [
            finding.source_title.as_str(),
            finding.source_url.as_str(),
            finding.found_title.as_str(),
            finding.found_url.as_str(),
            similarity.as_str(),
            finding.matched_query.as_str(),
        ];
        ret.push_str(
            &row.iter()
                .map(|field| escape(field))
                .collect::<Vec<_>>()
                .join(","),
        );
        ret.push_str("\r\n");
    }

    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_quotes_when_needed() {
        let findings = vec![Finding {
            source_title: "Proračun, 2023".to_string(),
            source_url: "https://blog.example/a".to_string(),
            found_title: "Copy".to_string(),
            found_url: "https://copy.example/a".to_string(),
            similarity: 0.87654,
            matched_query: "\"budget deficit rose\"".to_string(),
        }];

        let csv = format(&findings);
        let mut lines = csv.split("\r\n");
        assert_eq!(
            lines.next(),
            Some("\u{feff}source_title,source_url,found_title,found_url,similarity,matched_query")
        );
        assert_eq!(
            lines.next(),
            Some(
                "\"Proračun, 2023\",https://blog.example/a,Copy,https://copy.example/a,0.8765,\"\"\"budget deficit rose\"\"\""
            )
        );
    }

    #[test]
    fn test_csv_header_only() {
        assert_eq!(format(&[]).lines().count(), 1);
    }
}
