use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};
use scraper::{ElementRef, Html, Node};
use tokio::sync::Semaphore;

use crate::{
    config::CandidateConfig,
    error::ResolutionFailure,
    providers::TextExtractor,
    transformers::{
        text::{squash_whitespace, word_count},
        url,
    },
};

macro_rules! sel {
    ($sel:literal) => {
        &scraper::Selector::parse($sel).expect("invalid selector")
    };
}

const SKIPPED: [&str; 12] = [
    "script", "style", "noscript", "template", "svg", "nav", "header", "footer", "aside", "form",
    "iframe", "button",
];

const BLOCKS: [&str; 20] = [
    "p", "div", "section", "article", "main", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4",
    "h5", "h6", "tr", "blockquote", "pre", "figcaption", "dd",
];

/// Readable content of one HTML page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedPage {
    pub title: String,
    /// Body text, one block element per line
    pub text: String,
    /// Absolute http(s) links found anywhere on the page
    pub links: Vec<String>,
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(&text.replace('\n', " "));
            }
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED.contains(&name) {
                    continue;
                }
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
                if BLOCKS.contains(&name) {
                    out.push('\n');
                }
            }
            _ => (),
        }
    }
}

/// Squashes every line and drops the empty ones.
fn tidy_lines(raw: &str) -> String {
    raw.lines()
        .map(squash_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pulls title, body text and links out of raw HTML.
///
/// The body is the `article` with the most words, then `main`, then `body`.
pub fn extract_html(html: &str, base_url: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title = document
        .select(sel!("h1"))
        .next()
        .or_else(|| document.select(sel!("title")).next())
        .map(|el| squash_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default();

    let article = document
        .select(sel!("article"))
        .map(|el| {
            let mut raw = String::new();
            collect_text(el, &mut raw);
            raw
        })
        .max_by_key(|raw| word_count(raw));

    let raw = match article {
        Some(raw) => raw,
        None => {
            let mut raw = String::new();
            if let Some(root) = document
                .select(sel!("main"))
                .next()
                .or_else(|| document.select(sel!("body")).next())
            {
                collect_text(root, &mut raw);
            }
            raw
        }
    };

    let links = document
        .select(sel!("a[href]"))
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| url::join(base_url, href))
        .collect();

    ExtractedPage {
        title,
        text: tidy_lines(&raw),
        links,
    }
}

fn is_pdf(content_type: &str, body: &[u8]) -> bool {
    content_type.starts_with("application/pdf") || body.starts_with(b"%PDF-")
}

/// Content types worth downloading. `octet-stream` is let through since
/// PDFs are often served that way.
fn is_readable(content_type: &str) -> bool {
    content_type.contains("html")
        || content_type.starts_with("text/")
        || content_type.starts_with("application/pdf")
        || content_type.starts_with("application/octet-stream")
}

/// Appends as much of `chunk` as fits under `limit`. True once the body is full.
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(body.len());
    body.extend_from_slice(&chunk[..chunk.len().min(room)]);
    body.len() >= limit
}

/// Turns a downloaded body into a page according to its content type.
pub(crate) async fn read_body(
    page_url: &str,
    content_type: &str,
    body: Vec<u8>,
) -> Result<ExtractedPage, ResolutionFailure> {
    let unreadable = |reason: String| ResolutionFailure::Unreadable {
        url: page_url.to_string(),
        reason,
    };

    if is_pdf(content_type, &body) {
        // pdf-extract is CPU bound and may panic on malformed files
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&body))
            .await
            .map_err(|e| unreadable(format!("PDF extraction aborted: {}", e)))?
            .map_err(|e| unreadable(format!("PDF extraction failed: {}", e)))?;
        return Ok(ExtractedPage {
            text: tidy_lines(&text),
            ..Default::default()
        });
    }

    let body = String::from_utf8_lossy(&body);
    if content_type.contains("html") {
        Ok(extract_html(&body, page_url))
    } else if content_type.starts_with("text/") {
        Ok(ExtractedPage {
            text: body.into_owned(),
            ..Default::default()
        })
    } else {
        Err(ResolutionFailure::Unsupported {
            url: page_url.to_string(),
            content_type: content_type.to_string(),
        })
    }
}

/// Fetches pages over HTTP and extracts their readable text from HTML, plain
/// text or PDF bodies.
///
/// In-flight requests are capped by a [`Semaphore`].
#[derive(Clone)]
pub struct HtmlExtractor {
    client: Client,
    semaphore: Arc<Semaphore>,
    max_body_bytes: usize,
}

impl HtmlExtractor {
    pub fn new(config: &CandidateConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .user_agent(config.user_agent.as_str())
                .build()?,
            semaphore: Arc::new(Semaphore::new(config.concurrency.max(1))),
            max_body_bytes: config.max_body_bytes.max(1),
        })
    }

    pub async fn fetch_page(&self, page_url: &str) -> Result<ExtractedPage, ResolutionFailure> {
        let unreachable = |reason: String| ResolutionFailure::Unreachable {
            url: page_url.to_string(),
            reason,
        };

        if !url::is_http(page_url) {
            return Err(unreachable("not an http(s) url".to_string()));
        }

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        log::debug!("Fetching {}", page_url);
        let mut response = self
            .client
            .get(page_url)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unreachable(format!("HTTP {}", response.status())));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("text/html")
            .to_lowercase();

        if !is_readable(&content_type) {
            return Err(ResolutionFailure::Unsupported {
                url: page_url.to_string(),
                content_type,
            });
        }

        if let Some(bytes) = response.content_length()
            && bytes > self.max_body_bytes as u64
        {
            return Err(ResolutionFailure::TooLarge {
                url: page_url.to_string(),
                bytes,
                limit: self.max_body_bytes,
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| unreachable(e.to_string()))?
        {
            if append_capped(&mut body, &chunk, self.max_body_bytes) {
                log::debug!("Cut {} off at {} bytes", page_url, self.max_body_bytes);
                break;
            }
        }

        read_body(page_url, &content_type, body).await
    }
}

#[async_trait]
impl TextExtractor for HtmlExtractor {
    fn name(&self) -> &'static str {
        "html"
    }

    async fn extract(&self, url: &str) -> Result<String, ResolutionFailure> {
        self.fetch_page(url).await.map(|page| page.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <head><title>Site | Deficit</title><style>p { color: red }</style></head>
          <body>
            <nav><a href="/hr/blog/">Blog</a></nav>
            <article>
              <h1>Budget deficit in 2023</h1>
              <p>The budget deficit rose
                 3% in 2023.</p>
              <script>var tracking = 1;</script>
              <p>Spending grew <b>faster</b> than revenue.</p>
              <a href="https://other.example/source">source</a>
            </article>
            <footer>Copyright</footer>
          </body>
        </html>"#;

    #[test]
    fn test_extract_article_text() {
        let page = extract_html(PAGE, "https://blog.example/hr/blog/deficit/");
        assert_eq!(page.title, "Budget deficit in 2023");
        assert_eq!(
            page.text,
            "Budget deficit in 2023\nThe budget deficit rose 3% in 2023.\nSpending grew faster than revenue.\nsource"
        );
    }

    #[test]
    fn test_extract_links_are_absolute() {
        let page = extract_html(PAGE, "https://blog.example/hr/blog/deficit/");
        assert_eq!(
            page.links,
            vec![
                "https://blog.example/hr/blog/".to_string(),
                "https://other.example/source".to_string()
            ]
        );
    }

    #[test]
    fn test_title_falls_back_to_title_tag() {
        let page = extract_html(
            "<html><head><title> Only   title </title></head><body><p>x</p></body></html>",
            "https://a.example/",
        );
        assert_eq!(page.title, "Only title");
        assert_eq!(page.text, "x");
    }

    #[test]
    fn test_longest_article_wins() {
        let page = extract_html(
            r#"<html><body>
                <article><p>Related teaser</p></article>
                <article><h2>Budget</h2><p>The real reposted body about the budget deficit.</p></article>
                <article><p>Another teaser</p></article>
            </body></html>"#,
            "https://a.example/",
        );
        assert_eq!(
            page.text,
            "Budget\nThe real reposted body about the budget deficit."
        );
    }

    #[tokio::test]
    async fn test_read_body_by_content_type() {
        let url = "https://a.example/doc";

        let page = read_body(url, "text/html; charset=utf-8", PAGE.as_bytes().to_vec())
            .await
            .unwrap();
        assert_eq!(page.title, "Budget deficit in 2023");

        let page = read_body(url, "text/plain", b"plain words".to_vec())
            .await
            .unwrap();
        assert_eq!(page.text, "plain words");

        let err = read_body(url, "application/octet-stream", vec![0, 1, 2])
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionFailure::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_broken_pdf_is_unreadable() {
        let err = read_body(
            "https://a.example/report.pdf",
            "application/pdf",
            b"not really a pdf".to_vec(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ResolutionFailure::Unreadable { .. }));

        // Sniffed by magic bytes when served without a PDF content type
        let err = read_body(
            "https://a.example/download",
            "application/octet-stream",
            b"%PDF-1.7 truncated".to_vec(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ResolutionFailure::Unreadable { .. }));
    }

    #[test]
    fn test_body_is_capped() {
        let mut body = Vec::new();
        assert!(!append_capped(&mut body, b"<html>", 10));
        assert!(append_capped(&mut body, b"<body>tail", 10));
        assert_eq!(body, b"<html><bod");
        assert!(append_capped(&mut body, b"more", 10));
        assert_eq!(body.len(), 10);
    }

    #[test]
    fn test_only_text_like_types_are_downloaded() {
        assert!(is_readable("text/html; charset=utf-8"));
        assert!(is_readable("application/xhtml+xml"));
        assert!(is_readable("application/pdf"));
        assert!(!is_readable("image/png"));
        assert!(!is_readable("video/mp4"));
    }

    #[tokio::test]
    async fn test_non_http_url_is_unreachable() {
        let extractor = HtmlExtractor::new(&CandidateConfig::default()).unwrap();
        let err = extractor.extract("budget deficit").await.unwrap_err();
        assert!(matches!(err, ResolutionFailure::Unreachable { .. }));
    }
}
