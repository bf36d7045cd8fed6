// src/checker/fetch.rs
// =============================================================================
// Fetches a URL through a country-specific proxy and boils the response down
// to a CountryOutcome.
//
// Key functionality:
// - One GET request per (url, country), routed through the given proxy
// - 30 second timeout per request, enforced by the client
// - Failures are turned into data (an outcome with `error` set), never
//   returned as Err
// - The page title is extracted with scraper
//
// The Fetcher trait is the seam the checker depends on, so tests can script
// responses without touching the network.
// =============================================================================

use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, Proxy};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::outcome::CountryOutcome;

/// Upper bound for a single request, connect to last body byte.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_REDIRECTS: usize = 10;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Performs one request on behalf of one country.
///
/// Implementations must always return an outcome and must not block for
/// longer than their own timeout.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, proxy: &Url, country: &str) -> CountryOutcome;
}

/// Real HTTP fetcher backed by reqwest.
///
/// One client is built per proxy URL and cloned for every later fetch
/// through that proxy.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
    clients: Arc<Mutex<HashMap<Url, Client>>>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        HttpFetcher {
            timeout: FETCH_TIMEOUT,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn client_for(&self, proxy: &Url) -> reqwest::Result<Client> {
        let mut clients = self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(client) = clients.get(proxy) {
            return Ok(client.clone());
        }

        let client = build_client(proxy, self.timeout)?;
        clients.insert(proxy.clone(), client.clone());
        Ok(client)
    }
}

// Idle connections are never kept, so the verification pass opens a new proxy
// session instead of reusing the first run's connection.
fn build_client(proxy: &Url, timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .proxy(Proxy::all(proxy.clone())?)
        .pool_max_idle_per_host(0)
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .user_agent(USER_AGENT)
        .default_headers(browser_headers())
        .build()
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, proxy: &Url, country: &str) -> CountryOutcome {
        let client = match self.client_for(proxy) {
            Ok(client) => client,
            Err(e) => return CountryOutcome::failed(country, format!("creating client: {}", e)),
        };

        let response = match client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(%url, %country, error = %e, "request failed");
                return CountryOutcome::failed(country, format!("making request: {}", categorize_error(&e)));
            }
        };

        let status_code = response.status().as_u16();

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                debug!(%url, %country, error = %e, "reading body failed");
                return CountryOutcome::failed(country, format!("reading body: {}", categorize_error(&e)));
            }
        };

        let title = extract_title(&String::from_utf8_lossy(&body)).unwrap_or_default();

        CountryOutcome::succeeded(country, status_code, title, body.len())
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers
}

// Turns a reqwest error into a short, stable message.
//
// The message ends up in the outcome's pattern, so it must not contain
// per-request noise (ports, connection ids) that would make two identical
// failures look different.
fn categorize_error(error: &reqwest::Error) -> String {
    // Walk the source chain, the top-level message is usually just
    // "error sending request for url (...)"
    let mut details = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        details.push(cause.to_string().to_lowercase());
        source = cause.source();
    }
    let details = details.join(": ");

    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else if details.contains("proxy") || details.contains("407") {
        "proxy error".to_string()
    } else if details.contains("certificate") || details.contains("tls") {
        "TLS error".to_string()
    } else if error.is_connect() {
        if details.contains("dns") {
            "could not resolve hostname".to_string()
        } else {
            "connection failed".to_string()
        }
    } else if error.is_body() || error.is_decode() {
        "invalid response body".to_string()
    } else {
        error.to_string()
    }
}

/// Extracts the trimmed text of the first <title> element.
///
/// Returns None when the document has no title.
pub fn extract_title(html: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let document = Html::parse_document(html);

    let title = document.select(&selector).next()?;
    Some(title.text().collect::<String>().trim().to_string())
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is fetch() infallible?
//    - A failed request in one country is a result, not a crash
//    - "blocked in cn, fine everywhere else" is exactly what we want to find
//    - So errors are folded into CountryOutcome::error and compared like any
//      other field
//
// 2. Why #[async_trait]?
//    - The checker stores the fetcher as Arc<dyn Fetcher>
//    - async fns in traits are not object safe without it
//
// 3. Why cache clients per proxy URL?
//    - Building a rustls client is not free, and a flagged URL is fetched
//      twice per country
//    - The proxy URL carries the country, so each cached client still talks
//      to exactly one exit country
//
// 4. Why bytes() and not text()?
//    - content_length is the size of the decoded body in bytes
//    - text() would re-encode and could change the length
// -----------------------------------------------------------------------------
