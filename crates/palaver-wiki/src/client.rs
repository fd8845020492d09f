//! HTTP client for the Wikipedia APIs.
//!
//! Search goes through the Wikimedia Core REST API, article content through
//! the MediaWiki action API (`prop=extracts|info|categories|links`). Base
//! URLs are configurable so tests can point at a mock server.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use palaver_protocol::PalaverError;

const DEFAULT_SEARCH_BASE: &str = "https://api.wikimedia.org/core/v1/wikipedia/en";
const DEFAULT_ACTION_BASE: &str = "https://en.wikipedia.org/w/api.php";
const USER_AGENT: &str = concat!(
    "palaver-wiki/",
    env!("CARGO_PKG_VERSION"),
    " (reference server; educational-purpose)"
);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the Wikipedia backend.
#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    /// The requested article does not exist.
    #[error("article '{0}' not found on Wikipedia")]
    NotFound(String),
    /// The HTTP request failed.
    #[error("wikipedia request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The response body did not have the expected shape.
    #[error("unexpected wikipedia response: {0}")]
    Decode(String),
}

impl From<WikiError> for PalaverError {
    fn from(err: WikiError) -> Self {
        match err {
            WikiError::NotFound(title) => {
                PalaverError::not_found(format!("article '{title}' not found on Wikipedia"))
            }
            other => PalaverError::external_service(other.to_string()),
        }
    }
}

/// A fetched article.
#[derive(Debug, Clone)]
pub struct WikiPage {
    /// Canonical article title.
    pub title: String,
    /// Canonical article URL, when the API reports one.
    pub url: Option<String>,
    /// Plain-text article body.
    pub text: String,
    /// Up to the first ten categories.
    pub categories: Vec<String>,
    /// Number of outgoing article links.
    pub link_count: usize,
}

impl WikiPage {
    /// Lead section of the article: the text up to the first blank line.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.text
            .split("\n\n")
            .next()
            .unwrap_or(&self.text)
            .trim()
    }
}

/// Client for Wikipedia search and article retrieval.
#[derive(Debug, Clone)]
pub struct WikipediaClient {
    http: reqwest::Client,
    search_base: Url,
    action_base: Url,
}

impl WikipediaClient {
    /// Create a client against the public Wikipedia endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new() -> Result<Self, WikiError> {
        let search_base = Url::parse(DEFAULT_SEARCH_BASE)
            .map_err(|e| WikiError::Decode(e.to_string()))?;
        let action_base = Url::parse(DEFAULT_ACTION_BASE)
            .map_err(|e| WikiError::Decode(e.to_string()))?;
        Self::with_base_urls(search_base, action_base)
    }

    /// Create a client against custom endpoints (used by tests).
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn with_base_urls(search_base: Url, action_base: Url) -> Result<Self, WikiError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            search_base,
            action_base,
        })
    }

    /// Search article titles by keyword.
    ///
    /// # Errors
    ///
    /// HTTP and decode failures; input validation is the caller's job.
    pub async fn search(&self, query: &str, limit: u8) -> Result<Vec<String>, WikiError> {
        let mut url = self.search_base.clone();
        url.path_segments_mut()
            .map_err(|()| WikiError::Decode("search base URL cannot be a base".into()))?
            .extend(["search", "page"]);

        let response = self
            .http
            .get(url)
            .query(&[("q", query), ("limit", &limit.to_string())])
            .send()
            .await?
            .error_for_status()?;

        let body: SearchResponse = response.json().await?;
        let titles = body.pages.into_iter().map(|page| page.title).collect();
        tracing::debug!(query, ?titles, "wikipedia search");
        Ok(titles)
    }

    /// Fetch an article with its text, URL, categories and link count.
    ///
    /// # Errors
    ///
    /// `NotFound` for missing articles, otherwise HTTP/decode failures.
    pub async fn fetch_page(&self, title: &str) -> Result<WikiPage, WikiError> {
        let response = self
            .http
            .get(self.action_base.clone())
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("prop", "extracts|info|categories|links"),
                ("explaintext", "1"),
                ("inprop", "url"),
                ("cllimit", "10"),
                ("pllimit", "max"),
                ("titles", title),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: QueryResponse = response.json().await?;
        let page = body
            .query
            .pages
            .into_iter()
            .next()
            .ok_or_else(|| WikiError::Decode("empty pages array".into()))?;

        if page.missing.unwrap_or(false) {
            return Err(WikiError::NotFound(title.to_string()));
        }

        Ok(WikiPage {
            title: page.title,
            url: page.fullurl,
            text: page.extract.unwrap_or_default(),
            categories: page
                .categories
                .unwrap_or_default()
                .into_iter()
                .map(|c| c.title)
                .collect(),
            link_count: page.links.unwrap_or_default().len(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    pages: Vec<SearchPage>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    title: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: QueryBody,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<PageBody>,
}

#[derive(Debug, Deserialize)]
struct PageBody {
    title: String,
    missing: Option<bool>,
    extract: Option<String>,
    fullurl: Option<String>,
    categories: Option<Vec<TitledEntry>>,
    links: Option<Vec<TitledEntry>>,
}

#[derive(Debug, Deserialize)]
struct TitledEntry {
    title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_the_lead_section() {
        let page = WikiPage {
            title: "Rust".into(),
            url: None,
            text: "Rust is a language.\nIt is fast.\n\nHistory section follows.".into(),
            categories: vec![],
            link_count: 0,
        };
        assert_eq!(page.summary(), "Rust is a language.\nIt is fast.");
    }

    #[test]
    fn summary_of_single_paragraph_is_whole_text() {
        let page = WikiPage {
            title: "Stub".into(),
            url: None,
            text: "Just one paragraph.".into(),
            categories: vec![],
            link_count: 0,
        };
        assert_eq!(page.summary(), "Just one paragraph.");
    }

    #[test]
    fn not_found_maps_to_typed_palaver_error() {
        let err: PalaverError = WikiError::NotFound("Ghost".into()).into();
        assert_eq!(err.kind, palaver_protocol::ErrorKind::NotFound);
    }
}
