use std::collections::HashSet;

use async_trait::async_trait;
use futures::future::join_all;

use crate::{
    models::OriginalDocument,
    providers::{
        DocumentSource,
        html::{ExtractedPage, HtmlExtractor},
    },
    transformers::url,
};

const LISTING_SEGMENTS: [&str; 6] = ["page", "tag", "tags", "category", "categories", "feed"];
const ASSET_SUFFIXES: [&str; 8] = [".xml", ".rss", ".atom", ".jpg", ".jpeg", ".png", ".gif", ".svg"];

/// Links on a blog index that point to individual posts below it.
pub fn post_links(index_url: &str, links: &[String]) -> Vec<String> {
    let index = url::canonicalize(index_url);
    let prefix = format!("{}/", index);
    let mut seen = HashSet::new();

    links
        .iter()
        .filter(|link| {
            let key = url::canonicalize(link);
            if !key.starts_with(&prefix) || key.contains('?') {
                return false;
            }
            let rest = &key[prefix.len()..];
            let lower = rest.to_lowercase();
            !rest.split('/').any(|segment| LISTING_SEGMENTS.contains(&segment))
                && !ASSET_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
        })
        .filter(|link| seen.insert(url::canonicalize(link)))
        .cloned()
        .collect()
}

/// A document for a fetched page, titled by the url when the page has no
/// title. Pages without text yield nothing.
fn document_from_page(page_url: &str, page: ExtractedPage) -> Option<OriginalDocument> {
    if page.text.trim().is_empty() {
        log::warn!("{} has no readable text, skipping", page_url);
        return None;
    }
    let title = if page.title.is_empty() {
        page_url.to_string()
    } else {
        page.title
    };
    Some(OriginalDocument::new(title, page_url, page.text))
}

/// Every post linked from a blog index page.
pub struct BlogIndex {
    index_url: String,
    extractor: HtmlExtractor,
}

impl BlogIndex {
    pub fn new(index_url: impl Into<String>, extractor: HtmlExtractor) -> Self {
        Self {
            index_url: index_url.into(),
            extractor,
        }
    }
}

#[async_trait]
impl DocumentSource for BlogIndex {
    fn name(&self) -> &'static str {
        "blog"
    }

    async fn documents(&self) -> Vec<OriginalDocument> {
        let index = match self.extractor.fetch_page(&self.index_url).await {
            Ok(page) => page,
            Err(e) => {
                log::error!("Failed to fetch blog index {}: {}", self.index_url, e);
                return vec![];
            }
        };

        let links = post_links(&self.index_url, &index.links);
        log::info!("Found {} post links on {}", links.len(), self.index_url);

        let tasks = links.iter().map(|link| async move {
            match self.extractor.fetch_page(link).await {
                Ok(page) => document_from_page(link, page),
                Err(e) => {
                    log::warn!("Skipping post: {}", e);
                    None
                }
            }
        });

        join_all(tasks).await.into_iter().flatten().collect()
    }
}

/// One article given by url.
pub struct SingleDocument {
    url: String,
    extractor: HtmlExtractor,
}

impl SingleDocument {
    pub fn new(url: impl Into<String>, extractor: HtmlExtractor) -> Self {
        Self {
            url: url.into(),
            extractor,
        }
    }
}

#[async_trait]
impl DocumentSource for SingleDocument {
    fn name(&self) -> &'static str {
        "document"
    }

    async fn documents(&self) -> Vec<OriginalDocument> {
        match self.extractor.fetch_page(&self.url).await {
            Ok(page) => document_from_page(&self.url, page).into_iter().collect(),
            Err(e) => {
                log::error!("Failed to fetch document: {}", e);
                vec![]
            }
        }
    }
}

/// A query typed by the user, searched as-is.
pub struct ManualQuery(pub String);

#[async_trait]
impl DocumentSource for ManualQuery {
    fn name(&self) -> &'static str {
        "manual"
    }

    async fn documents(&self) -> Vec<OriginalDocument> {
        if self.0.trim().is_empty() {
            return vec![];
        }
        vec![OriginalDocument::from_manual_query(&self.0)]
    }
}
