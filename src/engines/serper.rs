use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{config::SearchConfig, engines::WebSearch, error::SearchError, models::SearchResult};

/// Google Search through serper.dev.
#[derive(Clone, Debug)]
pub struct Serper {
    client: Client,
    api_key: String,
    endpoint: String,
    gl: Option<String>,
    hl: Option<String>,
}

#[derive(Serialize, Debug)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    gl: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hl: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Deserialize, Debug)]
struct SerperResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

impl From<SerperResult> for SearchResult {
    fn from(result: SerperResult) -> Self {
        SearchResult {
            title: result.title,
            url: result.link,
            snippet: result.snippet,
        }
    }
}

pub(crate) fn classify_status(status: StatusCode, body: &str) -> SearchError {
    let message = body.trim().chars().take(200).collect::<String>();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SearchError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => SearchError::RateLimited(message),
        StatusCode::REQUEST_TIMEOUT => SearchError::Transient(message),
        status if status.is_server_error() => {
            SearchError::Transient(format!("{}: {}", status, message))
        }
        status => SearchError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

impl Serper {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::Transient(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.trim().to_string(),
            endpoint: config.endpoint.clone(),
            gl: config.gl.clone(),
            hl: config.hl.clone(),
        })
    }
}

#[async_trait]
impl WebSearch for Serper {
    fn name(&self) -> &'static str {
        "serper"
    }

    fn check_credentials(&self) -> Result<(), SearchError> {
        if self.api_key.is_empty() {
            return Err(SearchError::Auth("no API key configured".to_string()));
        }
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.check_credentials()?;

        log::info!("Searching {} for {:?}", self.name(), query);

        let body = SerperRequest {
            q: query,
            num: max_results,
            gl: self.gl.as_deref(),
            hl: self.hl.as_deref(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = classify_status(status, &text);
            log::error!("Serper error for {:?}: {}", query, err);
            return Err(err);
        }

        let data: SerperResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        let results: Vec<SearchResult> = data.organic.into_iter().map(Into::into).collect();
        log::info!("Serper returned {} results for {:?}", results.len(), query);

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::UNAUTHORIZED, "").is_fatal());
        assert!(classify_status(StatusCode::FORBIDDEN, "Unauthorized.").is_fatal());
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            SearchError::RateLimited(_)
        ));
        assert!(classify_status(StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "Not enough credits"),
            SearchError::Rejected { status: 400, .. }
        ));
    }

    #[test]
    fn test_decode_response() {
        let raw = r#"{
            "searchParameters": {"q": "budget deficit"},
            "organic": [
                {"title": "Deficit", "link": "https://news.example/deficit", "snippet": "The budget", "position": 1},
                {"title": "No snippet", "link": "https://other.example/x"}
            ]
        }"#;
        let data: SerperResponse = serde_json::from_str(raw).unwrap();
        let results: Vec<SearchResult> = data.organic.into_iter().map(Into::into).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://news.example/deficit");
        assert_eq!(results[1].snippet, "");
    }

    #[test]
    fn test_missing_organic_is_empty() {
        let data: SerperResponse = serde_json::from_str(r#"{"credits": 1}"#).unwrap();
        assert!(data.organic.is_empty());
    }

    #[test]
    fn test_request_skips_missing_locale() {
        let body = SerperRequest {
            q: "x",
            num: 15,
            gl: None,
            hl: Some("hr"),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"q": "x", "num": 15, "hl": "hr"})
        );
    }

    #[tokio::test]
    async fn test_empty_key_fails_without_network() {
        let serper = Serper::new(&SearchConfig::default()).unwrap();
        let err = serper.search("anything", 10).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
