//! HTTP client for embed page requests

use crate::config::Config;
use crate::download::{RetryConfig, RetryConfigBuilder, RetryExecutor};
use crate::error::ScrapeError;
use crate::utils::page_url;
use futures::FutureExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, SET_COOKIE};
use reqwest::{Client, ClientBuilder};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info};
use url::Url;

/// Browser profile sent with every page request, in wire order.
///
/// Host-derived values come from the configured page base URL.
pub fn browser_headers(config: &Config) -> Vec<(&'static str, String)> {
    let host = config.page_host();
    vec![
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
                .to_string(),
        ),
        ("Accept-Language", "en-US,en;q=0.5".to_string()),
        ("Alt-Used", host.clone()),
        ("Connection", "keep-alive".to_string()),
        ("Cookie", config.cookie.clone()),
        ("DNT", "1".to_string()),
        ("Host", host),
        ("Sec-Fetch-Dest", "document".to_string()),
        ("Sec-Fetch-Mode", "navigate".to_string()),
        ("Sec-Fetch-Site", "none".to_string()),
        ("Sec-Fetch-User", "?1".to_string()),
        ("Upgrade-Insecure-Requests", "1".to_string()),
        ("User-Agent", config.user_agent.clone()),
    ]
}

/// An embed page together with the request and response metadata
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Requested URL
    pub url: String,
    pub html: String,
    /// Headers sent, by their canonical names
    pub request_headers: BTreeMap<String, String>,
    /// Response headers; repeated headers become arrays
    pub response_headers: Map<String, Value>,
    /// Every `Set-Cookie` value, in order
    pub set_cookies: Vec<String>,
}

impl FetchedPage {
    /// Cookie header that was sent
    pub fn cookie_header(&self) -> &str {
        self.request_headers
            .get("Cookie")
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Fetches embed pages with a fixed browser header set
#[derive(Debug, Clone)]
pub struct PageClient {
    client: Client,
    base_url: String,
    referer: String,
    request_headers: BTreeMap<String, String>,
    header_map: HeaderMap,
    retry: RetryExecutor,
}

impl PageClient {
    /// Create a client from configuration
    pub fn new(config: &Config) -> Result<Self, ScrapeError> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        let mut header_map = HeaderMap::new();
        let mut request_headers = BTreeMap::new();
        for (name, value) in browser_headers(config) {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ScrapeError::InvalidHeader(name.to_string()))?;
            let header_value = HeaderValue::from_str(&value)
                .map_err(|_| ScrapeError::InvalidHeader(name.to_string()))?;
            header_map.insert(header_name, header_value);
            request_headers.insert(name.to_string(), value);
        }

        let retry = RetryExecutor::with_config(
            RetryConfigBuilder::new()
                .max_retries(config.max_retries)
                .build(),
        );

        Ok(Self {
            client,
            base_url: config.page_base_url.clone(),
            referer: config.referer.clone(),
            request_headers,
            header_map,
            retry,
        })
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry = RetryExecutor::with_config(config);
        self
    }

    /// Embed page URL for a video id
    pub fn page_url(&self, video_id: &str) -> Result<Url, ScrapeError> {
        page_url(&self.base_url, video_id, &self.referer)
    }

    /// Fetch the embed page of a video, retrying transient failures
    pub async fn fetch_page(&self, video_id: &str) -> Result<FetchedPage, ScrapeError> {
        let url = self.page_url(video_id)?;
        info!("Fetching video data from: {}", url);

        let page = self
            .retry
            .execute(|| {
                fetch_once(
                    self.client.clone(),
                    url.clone(),
                    self.header_map.clone(),
                    self.request_headers.clone(),
                )
                .boxed()
            })
            .await?;

        info!(
            "Received cookies: {}",
            if page.set_cookies.is_empty() { "No" } else { "Yes" }
        );
        Ok(page)
    }
}

async fn fetch_once(
    client: Client,
    url: Url,
    headers: HeaderMap,
    request_headers: BTreeMap<String, String>,
) -> Result<FetchedPage, ScrapeError> {
    let response = client.get(url.clone()).headers(headers).send().await?;

    let status = response.status();
    if !status.is_success() {
        debug!("Page request failed with status {}", status);
        return Err(ScrapeError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let response_headers = headers_to_json(response.headers());
    let set_cookies = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .collect();
    let html = response.text().await?;
    debug!("Fetched {} bytes of HTML", html.len());

    Ok(FetchedPage {
        url: url.to_string(),
        html,
        request_headers,
        response_headers,
        set_cookies,
    })
}

fn headers_to_json(headers: &HeaderMap) -> Map<String, Value> {
    headers
        .keys()
        .map(|name| {
            let mut values: Vec<Value> = headers
                .get_all(name)
                .iter()
                .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
                .collect();
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_COOKIE;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfigBuilder::new()
            .max_retries(max_retries)
            .initial_delay(Duration::from_millis(1))
            .jitter_factor(0.0)
            .build()
    }

    #[test]
    fn test_browser_headers() {
        let headers = browser_headers(&Config::default());
        let map: BTreeMap<_, _> = headers.into_iter().collect();

        assert_eq!(map["Host"], "zpjid.com");
        assert_eq!(map["Alt-Used"], "zpjid.com");
        assert_eq!(map["Cookie"], DEFAULT_COOKIE);
        assert!(map["User-Agent"].contains("Firefox/124.0"));
        assert_eq!(map.len(), 13);
    }

    #[test]
    fn test_invalid_header_rejected() {
        let config = Config::default().with_cookie("bad\nvalue");
        assert!(matches!(
            PageClient::new(&config),
            Err(ScrapeError::InvalidHeader(name)) if name == "Cookie"
        ));
    }

    #[tokio::test]
    async fn test_fetch_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/bkg/9q4yh8ji5k4w")
            .match_query(Matcher::UrlEncoded("ref".into(), "animedub.pro".into()))
            .match_header("cookie", DEFAULT_COOKIE)
            .match_header("dnt", "1")
            .match_header("sec-fetch-mode", "navigate")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_header("set-cookie", "a=1; path=/")
            .with_header("set-cookie", "b=2; HttpOnly")
            .with_body("<html>ok</html>")
            .create_async()
            .await;

        let config = Config::default().with_base_url(format!("{}/bkg", server.url()));
        let client = PageClient::new(&config).unwrap();
        let page = client.fetch_page("9q4yh8ji5k4w").await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.html, "<html>ok</html>");
        assert_eq!(page.set_cookies, vec!["a=1; path=/", "b=2; HttpOnly"]);
        assert_eq!(page.cookie_header(), DEFAULT_COOKIE);
        assert_eq!(page.request_headers["Host"], config.page_host());
        assert_eq!(page.response_headers["content-type"], json!("text/html"));
        assert_eq!(
            page.response_headers["set-cookie"],
            json!(["a=1; path=/", "b=2; HttpOnly"])
        );
        assert!(page.url.ends_with("/bkg/9q4yh8ji5k4w?ref=animedub.pro"));
    }

    #[tokio::test]
    async fn test_fetch_page_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/bkg/abc")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let config = Config::default().with_base_url(format!("{}/bkg", server.url()));
        let client = PageClient::new(&config).unwrap().with_retry(fast_retry(2));
        let err = client.fetch_page("abc").await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ScrapeError::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_page_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/bkg/abc")
            .match_query(Matcher::Any)
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let config = Config::default().with_base_url(format!("{}/bkg", server.url()));
        let client = PageClient::new(&config).unwrap().with_retry(fast_retry(3));
        let err = client.fetch_page("abc").await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ScrapeError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_invalid_id() {
        let client = PageClient::new(&Config::default()).unwrap();
        let err = client.fetch_page("../secret").await.unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidVideoId(_)));
    }
}
