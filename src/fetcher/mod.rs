use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{Category, ListPage};
use crate::validator;

pub const DEFAULT_API_BASE: &str = "https://rickandmortyapi.com/api";

const USER_AGENT: &str = concat!("catalogview/", env!("CARGO_PKG_VERSION"));

// the query for one page of one category, filters already serialized
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageQuery {
    pub category: Category,
    pub page: u32,
    pub params: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid request url {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

/// Source of list pages.
///
/// A malformed or unrecognised body is not an error: implementations answer
/// with [`ListPage::empty`]. Only transport-level failures come back as `Err`.
#[async_trait]
pub trait ListFetcher: Send + Sync {
    async fn fetch(&self, query: &PageQuery) -> Result<ListPage, FetchError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetcherOptions {
    pub api_base: String,
    // 0 disables the timeout
    pub timeout_seconds: u64,
    // requests per second, 0 disables the limiter
    pub rate: u32,
    pub proxy: Option<String>,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_seconds: 0,
            rate: 0,
            proxy: None,
        }
    }
}

pub struct HttpListFetcher {
    client: reqwest::Client,
    api_base: String,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl HttpListFetcher {
    pub fn new(options: &FetcherOptions) -> Result<Self, BuildError> {
        let client = build_client(options.proxy.as_deref(), options.timeout_seconds)?;
        let limiter = NonZeroU32::new(options.rate).map(|rate| RateLimiter::direct(Quota::per_second(rate)));
        Ok(Self {
            client,
            api_base: options.api_base.trim_end_matches('/').to_string(),
            limiter,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

fn build_client(proxy: Option<&str>, timeout_seconds: u64) -> Result<reqwest::Client, BuildError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(USER_AGENT),
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10));

    if timeout_seconds > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_seconds));
    }

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| BuildError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| BuildError::HttpClientBuild { source: e })
}

/// `<base>/<endpoint>?page=<n>` followed by `&<params>` when any filters apply.
pub fn list_url(api_base: &str, query: &PageQuery) -> String {
    let mut url = format!(
        "{}/{}?page={}",
        api_base.trim_end_matches('/'),
        query.category.endpoint(),
        query.page
    );
    let params = query.params.trim_start_matches('&');
    if !params.is_empty() {
        url.push('&');
        url.push_str(params);
    }
    url
}

/// Turns a raw response body into a page for `category`, or the empty page.
pub fn parse_list_body(category: Category, body: &[u8]) -> ListPage {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            debug!(%category, error = %e, "response body is not json");
            return ListPage::empty();
        }
    };
    match validator::decode_envelope(category, value) {
        Some(page) => page,
        None => {
            debug!(%category, "response body failed envelope validation");
            ListPage::empty()
        }
    }
}

#[async_trait]
impl ListFetcher for HttpListFetcher {
    async fn fetch(&self, query: &PageQuery) -> Result<ListPage, FetchError> {
        let url = list_url(&self.api_base, query);
        let parsed = reqwest::Url::parse(&url).map_err(|e| FetchError::InvalidUrl {
            url: url.clone(),
            message: e.to_string(),
        })?;

        if let Some(limiter) = self.limiter.as_ref() {
            limiter.until_ready().await;
        }

        debug!(%url, "fetching list page");
        let resp = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.clone(),
                source: e,
            })?;

        // the api answers unmatched filters with a 404 json error body; let the
        // validator reject it like any other malformed body
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| FetchError::Transport {
            url: url.clone(),
            source: e,
        })?;

        let page = parse_list_body(query.category, &body);
        if page.is_empty() && !status.is_success() {
            warn!(%url, status = status.as_u16(), "list request returned no usable page");
        }
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(category: Category, page: u32, params: &str) -> PageQuery {
        PageQuery {
            category,
            page,
            params: params.to_string(),
        }
    }

    #[test]
    fn list_url_without_filters() {
        assert_eq!(
            list_url(DEFAULT_API_BASE, &query(Category::Characters, 1, "")),
            "https://rickandmortyapi.com/api/character?page=1"
        );
    }

    #[test]
    fn list_url_passes_filters_through() {
        assert_eq!(
            list_url(
                "http://localhost:8080/api/",
                &query(Category::Locations, 3, "name=Earth&type=Planet")
            ),
            "http://localhost:8080/api/location?page=3&name=Earth&type=Planet"
        );
    }

    #[test]
    fn malformed_body_is_empty_page() {
        assert_eq!(
            parse_list_body(Category::Episodes, b"<html>oops</html>"),
            ListPage::empty()
        );
        assert_eq!(
            parse_list_body(Category::Episodes, br#"{"error":"There is nothing here"}"#),
            ListPage::empty()
        );
        assert_eq!(
            parse_list_body(Category::Episodes, br#"{"results":[]}"#),
            ListPage::empty()
        );
    }

    #[test]
    fn body_for_another_category_is_empty_page() {
        let body = br#"{"info":{"pages":3},"results":[{"air_date":"December 2, 2013","name":"Pilot","episode":"S01E01"}]}"#;
        assert_eq!(parse_list_body(Category::Locations, body), ListPage::empty());

        let page = parse_list_body(Category::Episodes, body);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.records.len(), 1);
    }
}
