//! Response composer.
//!
//! When a movie-domain query's trace contains both a movie record and a
//! trailer list, the model's free-text answer is replaced with a
//! deterministically formatted composite document.

use crate::conversation::ToolInvocation;
use crate::lookup::{MovieRecord, VideoDescriptor};
use serde_json::Value;

/// Keywords marking a query as movie/TV-domain.
const MOVIE_KEYWORDS: [&str; 15] = [
    "movie", "film", "show", "series", "tv", "watch", "trailer", "actor", "actress", "director",
    "imdb", "rating", "plot", "synopsis", "cast",
];

/// Minimum composite length before it replaces the model's own answer.
const MIN_COMPOSITE_LEN: usize = 100;

/// Case-insensitive keyword-substring classification.
pub fn is_movie_query(query: &str) -> bool {
    let query = query.to_lowercase();
    MOVIE_KEYWORDS.iter().any(|keyword| query.contains(keyword))
}

/// Produce the final answer for a query: the composite document when the
/// trace yields enough structured data, the model's own text otherwise.
pub fn compose_answer(query: &str, model_text: &str, trace: &[ToolInvocation]) -> String {
    if !is_movie_query(query) || trace.is_empty() {
        return model_text.to_string();
    }

    let movie = trace
        .iter()
        .filter(|call| call.tool == "movie_info_search")
        .last()
        .and_then(|call| movie_record(&call.output));

    let trailers = trace
        .iter()
        .filter(|call| call.tool == "movie_trailer_search")
        .last()
        .and_then(|call| video_list(&call.output));

    if let (Some(movie), Some(trailers)) = (movie, trailers) {
        let composite = format!(
            "{}\n---\n\n{}",
            format_movie_info(&movie),
            format_trailer_results(&trailers)
        );
        if composite.len() > MIN_COMPOSITE_LEN {
            return composite;
        }
    }

    model_text.to_string()
}

/// Decode a movie record from a trace output. An `error` payload signals
/// total lookup failure and short-circuits composition.
fn movie_record(output: &Value) -> Option<MovieRecord> {
    let object = output.as_object()?;
    if object.contains_key("error") {
        return None;
    }
    serde_json::from_value(output.clone()).ok()
}

/// Decode a trailer list from a trace output (wrapped under `results` by
/// normalization). An error element short-circuits composition.
fn video_list(output: &Value) -> Option<Vec<VideoDescriptor>> {
    let results = output.get("results")?.as_array()?;
    if results.iter().any(|entry| entry.get("error").is_some()) {
        return None;
    }
    serde_json::from_value(Value::Array(results.clone())).ok()
}

/// Render a movie record as a markdown block.
pub fn format_movie_info(info: &MovieRecord) -> String {
    let title = info.title.as_deref().unwrap_or("Unknown Title");
    let year = info.release_year.as_deref().unwrap_or("Unknown Year");

    let mut formatted = format!("# {} ({})\n\n", title, year);

    if let Some(rating) = info.imdb_rating {
        formatted.push_str(&format!("**IMDb Rating:** {}/10\n\n", rating));
    }
    if let Some(genre) = &info.genre {
        formatted.push_str(&format!("**Genre:** {}\n\n", genre));
    }
    if let Some(director) = &info.director {
        formatted.push_str(&format!("**Director:** {}\n\n", director));
    }
    if let Some(synopsis) = &info.synopsis {
        formatted.push_str(&format!("### Synopsis\n{}\n\n", synopsis));
    }
    if !info.sources.is_empty() {
        formatted.push_str("### Sources\n");
        for source in &info.sources {
            formatted.push_str(&format!("- [{}]({})\n", source.title, source.url));
        }
    }

    formatted
}

/// Render a trailer list as a markdown block with thumbnail links.
pub fn format_trailer_results(trailers: &[VideoDescriptor]) -> String {
    if trailers.is_empty() {
        return "No trailer results found.".to_string();
    }

    let mut formatted = String::from("# Available Trailers\n\n");

    for trailer in trailers {
        let tag = if trailer.is_likely_trailer.unwrap_or(false) {
            " (Official Trailer)"
        } else {
            ""
        };

        if trailer.video_id.is_empty() {
            formatted.push_str(&format!("## [{}{}]({})\n\n", trailer.title, tag, trailer.url));
        } else {
            let thumbnail = format!(
                "https://i.ytimg.com/vi/{}/hqdefault.jpg",
                trailer.video_id
            );
            formatted.push_str(&format!("## [{}{}]({})\n", trailer.title, tag, trailer.url));
            formatted.push_str(&format!(
                "[![Trailer Thumbnail]({})]({})\n\n",
                thumbnail, trailer.url
            ));
        }
    }

    formatted
}
