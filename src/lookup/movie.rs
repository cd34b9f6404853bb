//! Movie and TV show information lookup.
//!
//! Two-phase strategy: a precise IMDb title-page scrape, then a broader
//! search with snippet heuristics for whatever is still missing. Every
//! extraction step is independently best-effort.

use super::{clean_text, engine_search, WebClient};
use crate::error::Result;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

/// A source page the record was assembled from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

/// Best-effort structured movie record. Absence of a field is a normal
/// outcome, not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// Maximum synopsis length in the fallback path.
const SYNOPSIS_LIMIT: usize = 300;

fn h1_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<h1[^>]*>(.*?)</h1>").expect("Invalid regex"))
}

fn title_year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\((\d{4})\)").expect("Invalid regex"))
}

fn release_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)href="[^"]*releaseinfo[^"]*"[^>]*>(.*?)</a>"#).expect("Invalid regex")
    })
}

fn release_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"release-date-item__date[^>]*>([^<]+)<").expect("Invalid regex")
    })
}

fn hero_rating_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"hero-rating-bar__aggregate-rating__score[^>]*>\s*<span[^>]*>([0-9.]+)"#,
        )
        .expect("Invalid regex")
    })
}

fn director_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<span[^>]*>\s*Directors?\s*</span>.*?<a[^>]*>(.*?)</a>")
            .expect("Invalid regex")
    })
}

fn genre_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"href="[^"]*genres=[^"]*"[^>]*>([^<]+)<"#).expect("Invalid regex")
    })
}

fn plot_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)data-testid="plot"[^>]*>(.*?)</(?:p|div)>"#).expect("Invalid regex")
    })
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("Invalid regex"))
}

fn rating_patterns() -> &'static [Regex; 4] {
    static RES: OnceLock<[Regex; 4]> = OnceLock::new();
    RES.get_or_init(|| {
        let build = |pattern: &str| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("Invalid regex")
        };
        [
            build(r"imdb rating[:\s]+(\d+\.?\d*)"),
            build(r"rated[:\s]+(\d+\.?\d*)/10"),
            build(r"rating[:\s]+(\d+\.?\d*)"),
            build(r"(\d+\.?\d*)/10"),
        ]
    })
}

/// Look up structured information about a movie or TV show.
///
/// Returns whatever fields could be recovered; a failure of the underlying
/// search itself is the only total failure.
pub async fn movie_info_search(
    web: &dyn WebClient,
    query: &str,
    num_results: usize,
) -> Result<MovieRecord> {
    let mut record = MovieRecord::default();

    // Phase 1: find the IMDb title page and scrape it.
    let enhanced_query = format!("{} site:imdb.com", query);
    let hits = engine_search(web, &enhanced_query, 3).await?;

    let mut imdb_url = None;
    for hit in &hits {
        if hit.url.contains("imdb.com/title/") && !hit.url.contains("/releaseinfo") {
            record.sources.push(Source {
                title: if hit.title.is_empty() {
                    "IMDb".to_string()
                } else {
                    hit.title.clone()
                },
                url: hit.url.clone(),
            });
            imdb_url = Some(hit.url.clone());
            break;
        }
    }

    if let Some(url) = &imdb_url {
        match web.get(url).await {
            Ok(page) => scrape_title_page(web, url, &page, &mut record).await,
            Err(e) => debug!("IMDb page fetch failed: {}", e),
        }
    }

    // Phase 2: fill still-missing fields from a broader search.
    if record.title.is_none() || record.release_year.is_none() {
        let fallback_query = format!("{} movie information IMDb rating release date", query);
        let hits = engine_search(web, &fallback_query, num_results).await?;

        for hit in &hits {
            if !record.sources.iter().any(|s| s.url == hit.url) {
                record.sources.push(Source {
                    title: hit.title.clone(),
                    url: hit.url.clone(),
                });
            }

            let content = hit.snippet.to_lowercase();

            if record.title.is_none() && !hit.title.is_empty() {
                record.title = Some(strip_title_noise(&hit.title));
            }

            if record.release_year.is_none() {
                if let Some(caps) = year_regex().captures(&content) {
                    record.release_year = Some(caps[1].to_string());
                }
            }

            if record.imdb_rating.is_none() {
                record.imdb_rating = extract_snippet_rating(&content);
            }

            if record.synopsis.is_none() && content.len() > 100 {
                let truncated: String = content.chars().take(SYNOPSIS_LIMIT).collect();
                record.synopsis = Some(format!("{}...", truncated));
            }
        }
    }

    Ok(record)
}

/// Scrape an IMDb title page. Each field is extracted independently;
/// one missing element never aborts the others.
async fn scrape_title_page(web: &dyn WebClient, url: &str, page: &str, record: &mut MovieRecord) {
    if let Some(caps) = h1_regex().captures(page) {
        let full_title = clean_text(&caps[1]);
        if !full_title.is_empty() {
            if let Some(year) = title_year_regex().captures(&full_title) {
                record.release_year = Some(year[1].to_string());
            }
            record.title = Some(full_title);
        }
    }

    if record.release_year.is_none() {
        record.release_year = release_link_year(page);
    }
    if record.release_year.is_none() {
        record.release_year = release_page_year(web, url).await;
    }

    if let Some(caps) = hero_rating_regex().captures(page) {
        if let Ok(rating) = caps[1].parse::<f64>() {
            // Out-of-range text is discarded silently.
            if (0.0..=10.0).contains(&rating) {
                record.imdb_rating = Some(rating);
            }
        }
    }

    if let Some(caps) = director_regex().captures(page) {
        let director = clean_text(&caps[1]);
        if !director.is_empty() {
            record.director = Some(director);
        }
    }

    let genres: Vec<String> = genre_regex()
        .captures_iter(page)
        .take(3)
        .map(|c| clean_text(&c[1]))
        .filter(|g| !g.is_empty())
        .collect();
    if !genres.is_empty() {
        record.genre = Some(genres.join(", "));
    }

    if let Some(caps) = plot_regex().captures(page) {
        let synopsis = clean_text(&caps[1]);
        if !synopsis.is_empty() {
            record.synopsis = Some(synopsis);
        }
    }
}

/// Year from the title page's releaseinfo link text, if any.
fn release_link_year(page: &str) -> Option<String> {
    for caps in release_link_regex().captures_iter(page) {
        let text = clean_text(&caps[1]);
        if let Some(year) = year_regex().captures(&text) {
            return Some(year[1].to_string());
        }
    }
    None
}

/// Year from the dedicated release-date sub-page, if reachable.
async fn release_page_year(web: &dyn WebClient, imdb_url: &str) -> Option<String> {
    let base = imdb_url.split('?').next().unwrap_or(imdb_url);
    let release_url = format!("{}/releaseinfo", base.trim_end_matches('/'));

    let page = match web.get(&release_url).await {
        Ok(page) => page,
        Err(e) => {
            debug!("Release info fetch failed: {}", e);
            return None;
        }
    };

    for caps in release_date_regex().captures_iter(&page) {
        if let Some(year) = year_regex().captures(&caps[1]) {
            return Some(year[1].to_string());
        }
    }
    None
}

/// Drop common suffix noise from a search result title ("X - IMDb",
/// "X | Official Site").
fn strip_title_noise(title: &str) -> String {
    title
        .split(" - ")
        .next()
        .unwrap_or(title)
        .split(" | ")
        .next()
        .unwrap_or(title)
        .trim()
        .to_string()
}

/// First in-range rating match from the ordered snippet patterns.
fn extract_snippet_rating(content: &str) -> Option<f64> {
    for pattern in rating_patterns() {
        if let Some(caps) = pattern.captures(content) {
            if let Ok(rating) = caps[1].parse::<f64>() {
                if (0.0..=10.0).contains(&rating) {
                    return Some(rating);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::error::KinoError;

    struct FailingWeb;

    #[async_trait]
    impl WebClient for FailingWeb {
        async fn get(&self, _url: &str) -> Result<String> {
            Err(KinoError::Agent("network down".to_string()))
        }
    }

    struct PageWeb(String);

    #[async_trait]
    impl WebClient for PageWeb {
        async fn get(&self, _url: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_snippet_rating_accepts_in_range() {
        assert_eq!(extract_snippet_rating("the film was rated: 7.5/10"), Some(7.5));
        assert_eq!(extract_snippet_rating("imdb rating: 8.6 overall"), Some(8.6));
    }

    #[test]
    fn test_snippet_rating_rejects_out_of_range() {
        assert_eq!(extract_snippet_rating("rating: 15/10"), None);
        assert_eq!(extract_snippet_rating("no numbers here"), None);
    }

    #[test]
    fn test_strip_title_noise() {
        assert_eq!(strip_title_noise("Interstellar (2014) - IMDb"), "Interstellar (2014)");
        assert_eq!(strip_title_noise("The Matrix | Official Site"), "The Matrix");
        assert_eq!(strip_title_noise("Plain Title"), "Plain Title");
    }

    #[test]
    fn test_scrape_title_and_year_from_h1() {
        let page = r#"<h1 data-testid="hero__pageTitle"><span>Interstellar (2014)</span></h1>"#;
        let mut record = MovieRecord::default();
        tokio_test::block_on(scrape_title_page(&FailingWeb, "https://www.imdb.com/title/tt0816692/", page, &mut record));
        assert_eq!(record.title.as_deref(), Some("Interstellar (2014)"));
        assert_eq!(record.release_year.as_deref(), Some("2014"));
    }

    #[test]
    fn test_scrape_rating_validation() {
        let good = r#"<div data-testid="hero-rating-bar__aggregate-rating__score" class="x"><span class="y">8.7</span></div>"#;
        let bad = r#"<div data-testid="hero-rating-bar__aggregate-rating__score" class="x"><span class="y">87</span></div>"#;

        let mut record = MovieRecord::default();
        tokio_test::block_on(scrape_title_page(&FailingWeb, "https://www.imdb.com/title/tt1/", good, &mut record));
        assert_eq!(record.imdb_rating, Some(8.7));

        let mut record = MovieRecord::default();
        tokio_test::block_on(scrape_title_page(&FailingWeb, "https://www.imdb.com/title/tt1/", bad, &mut record));
        assert_eq!(record.imdb_rating, None);
    }

    #[test]
    fn test_scrape_genres_capped_at_three() {
        let page = r#"
            <a href="/search/title/?genres=adventure">Adventure</a>
            <a href="/search/title/?genres=drama">Drama</a>
            <a href="/search/title/?genres=sci-fi">Sci-Fi</a>
            <a href="/search/title/?genres=thriller">Thriller</a>
        "#;
        let mut record = MovieRecord::default();
        tokio_test::block_on(scrape_title_page(&FailingWeb, "https://www.imdb.com/title/tt1/", page, &mut record));
        assert_eq!(record.genre.as_deref(), Some("Adventure, Drama, Sci-Fi"));
    }

    #[tokio::test]
    async fn test_fallback_search_fills_fields_and_dedups_sources() {
        // Long, lowercase snippet: forces the truncated-synopsis path.
        let snippet = format!("imdb rating: 8.6 released 2014 {}", "wormhole ".repeat(40));
        let page = format!(
            r##"
            <a class="result__a" href="https://www.imdb.com/title/tt0816692/">Interstellar (2014) - IMDb</a>
            <a class="result__snippet" href="#">{}</a>
            <a class="result__a" href="https://www.imdb.com/title/tt0816692/">Interstellar again</a>
            <a class="result__snippet" href="#">also about the film</a>
            "##,
            snippet
        );

        // The stub serves this search page for every request, so the title
        // page scrape yields nothing and the fallback search has to fill
        // every field.
        let record = movie_info_search(&PageWeb(page), "Interstellar", 5)
            .await
            .unwrap();

        assert_eq!(record.title.as_deref(), Some("Interstellar (2014)"));
        assert_eq!(record.release_year.as_deref(), Some("2014"));
        assert_eq!(record.imdb_rating, Some(8.6));

        let synopsis = record.synopsis.unwrap();
        assert!(synopsis.ends_with("..."));
        assert_eq!(synopsis.chars().count(), SYNOPSIS_LIMIT + 3);

        // The same URL surfaces in both phases but is recorded once.
        assert_eq!(record.sources.len(), 1);
        assert_eq!(record.sources[0].url, "https://www.imdb.com/title/tt0816692/");
        assert_eq!(record.sources[0].title, "Interstellar (2014) - IMDb");
    }

    #[tokio::test]
    async fn test_total_search_failure_is_an_error() {
        let result = movie_info_search(&FailingWeb, "Interstellar", 3).await;
        assert!(result.is_err());
    }
}
