// booru.rs - Image Board Client
// Tag search against the Derpibooru JSON API.
//
// Key Features:
// - ImageBoard trait so the search command can run against a fake in tests
// - Derpibooru client built on a shared reqwest::Client
// - Response parsing kept separate from the HTTP call
//
// Used by: commands/derpi.rs, main.rs (construction)

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use crate::error::BoardError;

const SEARCH_URL: &str = "https://derpibooru.org/api/v1/json/search/images";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait ImageBoard: Send + Sync {
    /// Image URLs matching a tag query. An empty list is a valid answer.
    async fn search(&self, query: &str) -> Result<Vec<String>, BoardError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    images: Vec<SearchImage>,
}

#[derive(Debug, Deserialize)]
struct SearchImage {
    view_url: Option<String>,
}

/// Pull the image URLs out of a search response body
pub fn parse_search_response(body: &str) -> Result<Vec<String>, BoardError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .images
        .into_iter()
        .filter_map(|image| image.view_url)
        .filter(|url| !url.is_empty())
        .collect())
}

pub struct Derpibooru {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl Derpibooru {
    pub fn new(api_key: Option<String>) -> Result<Self, BoardError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sunbot_rust/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Derpibooru { client, api_key })
    }
}

#[async_trait]
impl ImageBoard for Derpibooru {
    async fn search(&self, query: &str) -> Result<Vec<String>, BoardError> {
        let mut params = vec![("q", query)];
        if let Some(key) = &self.api_key {
            params.push(("key", key.as_str()));
        }

        debug!("[DERPI] Searching for '{}'", query);
        let response = self.client.get(SEARCH_URL).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(BoardError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let urls = parse_search_response(&body)?;
        debug!("[DERPI] {} results", urls.len());
        Ok(urls)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Canned image board that remembers the queries it was given
    #[derive(Default)]
    pub struct FakeBoard {
        pub results: Vec<String>,
        pub fail: bool,
        pub queries: Mutex<Vec<String>>,
    }

    impl FakeBoard {
        pub fn with_results(results: &[&str]) -> Self {
            FakeBoard {
                results: results.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        pub fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageBoard for FakeBoard {
        async fn search(&self, query: &str) -> Result<Vec<String>, BoardError> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail {
                return Err(BoardError::Status(503));
            }
            Ok(self.results.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results() {
        let body = r#"{"images":[{"id":1,"view_url":"https://derpicdn.net/img/view/1.png"},{"id":2,"view_url":"https://derpicdn.net/img/view/2.gif"}],"total":2}"#;
        let urls = parse_search_response(body).unwrap();
        assert_eq!(
            urls,
            vec!["https://derpicdn.net/img/view/1.png", "https://derpicdn.net/img/view/2.gif"]
        );
    }

    #[test]
    fn test_parse_empty_results() {
        assert!(parse_search_response(r#"{"images":[],"total":0}"#).unwrap().is_empty());
        assert!(parse_search_response(r#"{"total":0}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_skips_entries_without_url() {
        let body = r#"{"images":[{"id":1},{"id":2,"view_url":""},{"id":3,"view_url":"u"}]}"#;
        assert_eq!(parse_search_response(body).unwrap(), vec!["u"]);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_search_response("<html>"), Err(BoardError::Parse(_))));
    }
}
