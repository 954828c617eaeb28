use std::path::Path;

use anyhow::{Context, Result};

use crate::{config::OutputFormat, models::Finding};

pub mod csv;
pub mod table;

pub fn render(findings: &[Finding], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Table => table::format(findings),
        OutputFormat::Csv => csv::format(findings),
        OutputFormat::Json => serde_json::to_string_pretty(findings)?,
    })
}

/// Writes rendered findings to `path`, or stdout when none is given.
pub async fn write(findings: &[Finding], format: OutputFormat, path: Option<&Path>) -> Result<()> {
    let rendered = render(findings, format)?;
    match path {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("Failed to write results to {}", path.display()))?;
            log::info!("Results written to {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_json() {
        let findings = vec![Finding {
            source_title: "A".to_string(),
            source_url: "https://blog.example/a".to_string(),
            found_title: "Copy".to_string(),
            found_url: "https://copy.example/a".to_string(),
            similarity: 1.0,
            matched_query: "A".to_string(),
        }];
        let json = render(&findings, OutputFormat::Json).unwrap();
        let parsed: Vec<Finding> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, findings);
    }
}
