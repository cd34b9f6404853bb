//! Lookup tools for the agent.
//!
//! All lookups are best-effort network operations: a failed request or an
//! unparseable page degrades to missing fields or an error payload, never a
//! crash. The HTML extraction here is deliberately regex-based and tolerant;
//! the scraped markup is unstable and partial results are the expected
//! steady state.

mod movie;
mod web;
mod youtube;

pub use movie::{movie_info_search, MovieRecord, Source};
pub use web::{web_search, SearchResult};
pub use youtube::{movie_trailer_search, youtube_search, VideoDescriptor};

use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

/// Browser User-Agent sent with every lookup request.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Minimal HTTP GET capability used by all lookup tools.
///
/// Tools depend on this trait rather than a concrete client so tests can
/// substitute canned pages or forced failures.
#[async_trait]
pub trait WebClient: Send + Sync {
    /// Fetch a URL and return the response body as text.
    async fn get(&self, url: &str) -> Result<String>;
}

/// Reqwest-backed web client with browser headers and a timeout.
pub struct HttpWebClient {
    client: reqwest::Client,
}

impl HttpWebClient {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

#[async_trait]
impl WebClient for HttpWebClient {
    async fn get(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

/// One raw hit from the search engine results page.
#[derive(Debug, Clone)]
pub(crate) struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

fn result_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<a([^>]*class="result__a"[^>]*)>(.*?)</a>"#).expect("Invalid regex")
    })
}

fn result_snippet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<a[^>]*class="result__snippet"[^>]*>(.*?)</a>"#).expect("Invalid regex")
    })
}

fn href_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"href="([^"]*)""#).expect("Invalid regex"))
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("Invalid regex"))
}

/// Search the web via the DuckDuckGo HTML endpoint.
///
/// Result ordering is the engine's ranking order; no deduplication.
pub(crate) async fn engine_search(
    web: &dyn WebClient,
    query: &str,
    max_results: usize,
) -> Result<Vec<SearchHit>> {
    let url = Url::parse_with_params("https://html.duckduckgo.com/html/", &[("q", query)])?;
    let page = web.get(url.as_str()).await?;
    Ok(parse_results_page(&page, max_results))
}

/// Extract search hits from a results page.
pub(crate) fn parse_results_page(page: &str, max_results: usize) -> Vec<SearchHit> {
    let snippets: Vec<String> = result_snippet_regex()
        .captures_iter(page)
        .map(|c| clean_text(&c[1]))
        .collect();

    let mut hits = Vec::new();
    for (i, caps) in result_link_regex().captures_iter(page).enumerate() {
        if hits.len() >= max_results {
            break;
        }
        let href = match href_regex().captures(&caps[1]) {
            Some(h) => h[1].to_string(),
            None => continue,
        };
        let url = resolve_redirect(&href);
        if url.is_empty() {
            continue;
        }
        hits.push(SearchHit {
            title: clean_text(&caps[2]),
            snippet: snippets.get(i).cloned().unwrap_or_default(),
            url,
        });
    }
    hits
}

/// Resolve the engine's redirect wrapper (`/l/?uddg=<target>`) to the target
/// URL, tolerating absolute, protocol-relative and path-relative forms.
pub(crate) fn resolve_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&absolute).or_else(|_| {
        Url::parse("https://duckduckgo.com").and_then(|base| base.join(&absolute))
    });

    if let Ok(parsed) = parsed {
        if let Some((_, target)) = parsed.query_pairs().find(|(k, _)| k == "uddg") {
            return target.into_owned();
        }
        return parsed.to_string();
    }
    href.to_string()
}

/// Strip tags, decode common entities and collapse whitespace.
pub(crate) fn clean_text(html: &str) -> String {
    let text = tag_regex().replace_all(html, " ");
    let text = decode_entities(&text);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the handful of entities that show up in search result markup.
fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
