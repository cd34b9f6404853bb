//! YouTube video and trailer search.
//!
//! Scrapes the results page directly: video ids by pattern match, titles by
//! a positional best-effort match with a synthetic fallback label.

use super::WebClient;
use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use url::Url;

/// Keywords marking a video title as a likely official trailer.
const TRAILER_KEYWORDS: [&str; 3] = ["trailer", "teaser", "official"];

/// One video from a YouTube results page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoDescriptor {
    /// 1-based position in the result list.
    pub index: usize,
    pub title: String,
    /// Canonical watch URL.
    pub url: String,
    pub thumbnail: String,
    pub video_id: String,
    /// Set by the trailer search only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_likely_trailer: Option<bool>,
}

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"watch\?v=([a-zA-Z0-9_-]{11})").expect("Invalid regex"))
}

/// Search for videos on YouTube.
pub async fn youtube_search(
    web: &dyn WebClient,
    query: &str,
    num_results: usize,
) -> Result<Vec<VideoDescriptor>> {
    search_videos(web, query, num_results, false).await
}

/// Search for trailers of a movie or TV show on YouTube.
pub async fn movie_trailer_search(
    web: &dyn WebClient,
    query: &str,
    num_results: usize,
) -> Result<Vec<VideoDescriptor>> {
    let enhanced_query = format!("{} official trailer", query);
    search_videos(web, &enhanced_query, num_results, true).await
}

async fn search_videos(
    web: &dyn WebClient,
    query: &str,
    num_results: usize,
    trailers: bool,
) -> Result<Vec<VideoDescriptor>> {
    let url = Url::parse_with_params(
        "https://www.youtube.com/results",
        &[("search_query", query)],
    )?;
    let page = web.get(url.as_str()).await?;

    let video_ids = extract_video_ids(&page, num_results);
    let fallback_label = if trailers { "Trailer" } else { "Video" };

    let results = video_ids
        .into_iter()
        .enumerate()
        .map(|(i, video_id)| {
            let index = i + 1;
            let title = extract_title(&page, &video_id)
                .unwrap_or_else(|| format!("{} {}", fallback_label, index));
            let is_likely_trailer = trailers.then(|| {
                let lowered = title.to_lowercase();
                TRAILER_KEYWORDS.iter().any(|k| lowered.contains(k))
            });

            VideoDescriptor {
                index,
                url: format!("https://www.youtube.com/watch?v={}", video_id),
                thumbnail: format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", video_id),
                title,
                video_id,
                is_likely_trailer,
            }
        })
        .collect();

    Ok(results)
}

/// Extract up to `limit` unique video ids from a results page, in page order.
fn extract_video_ids(page: &str, limit: usize) -> Vec<String> {
    let mut unique = Vec::new();
    for caps in video_id_regex().captures_iter(page) {
        let id = caps[1].to_string();
        if !unique.contains(&id) {
            unique.push(id);
            if unique.len() >= limit {
                break;
            }
        }
    }
    unique
}

/// Best-effort title lookup for one video id within the page body.
fn extract_title(page: &str, video_id: &str) -> Option<String> {
    let pattern = format!(r#""{}".*?"title".*?"([^"]+)""#, regex::escape(video_id));
    let re = Regex::new(&pattern).ok()?;
    re.captures(page).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct PageWeb(String);

    #[async_trait]
    impl WebClient for PageWeb {
        async fn get(&self, _url: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    const PAGE: &str = concat!(
        r#"watch?v=abc12345678 watch?v=abc12345678 "#,
        r#"{"videoId":"abc12345678","title":"Interstellar Official Trailer"} "#,
        r#"watch?v=def12345678 watch?v=ghi12345678"#,
    );

    #[test]
    fn test_extract_video_ids_dedups_in_order() {
        let ids = extract_video_ids(PAGE, 10);
        assert_eq!(ids, vec!["abc12345678", "def12345678", "ghi12345678"]);
    }

    #[test]
    fn test_extract_video_ids_caps_at_limit() {
        let ids = extract_video_ids(PAGE, 2);
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn test_trailer_search_flags_official_titles() {
        let web = PageWeb(PAGE.to_string());
        let results = movie_trailer_search(&web, "Interstellar", 3).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].video_id, "abc12345678");
        assert_eq!(results[0].index, 1);
        assert_eq!(
            results[0].url,
            "https://www.youtube.com/watch?v=abc12345678"
        );
        assert_eq!(
            results[0].thumbnail,
            "https://i.ytimg.com/vi/abc12345678/hqdefault.jpg"
        );
        // Title found positionally for the first id, fallback labels after
        assert_eq!(results[0].title, "Interstellar Official Trailer");
        assert_eq!(results[0].is_likely_trailer, Some(true));
        assert_eq!(results[1].title, "Trailer 2");
        assert_eq!(results[1].is_likely_trailer, Some(true));
    }

    #[tokio::test]
    async fn test_youtube_search_has_no_trailer_flag() {
        let web = PageWeb(PAGE.to_string());
        let results = youtube_search(&web, "Interstellar", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|v| v.is_likely_trailer.is_none()));
        assert_eq!(results[1].title, "Video 2");
    }
}
