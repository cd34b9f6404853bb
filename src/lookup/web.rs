//! General web search tool.

use super::{engine_search, WebClient};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One ranked web search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// 1-based position in the result list.
    pub index: usize,
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// Search the web and return up to `num_results` ranked results.
pub async fn web_search(
    web: &dyn WebClient,
    query: &str,
    num_results: usize,
) -> Result<Vec<SearchResult>> {
    let hits = engine_search(web, query, num_results).await?;

    Ok(hits
        .into_iter()
        .enumerate()
        .map(|(i, hit)| SearchResult {
            index: i + 1,
            title: hit.title,
            snippet: hit.snippet,
            url: hit.url,
        })
        .collect())
}
