//! Tool catalog: definitions, call parsing, and dispatch.
//!
//! The catalog is a closed set of four lookup tools. Dispatch never lets a
//! tool fault escape; any failure is converted into a structured error
//! payload tagged with the failing tool.

use crate::config::SearchSettings;
use crate::error::{KinoError, Result};
use crate::lookup::{
    movie_info_search, movie_trailer_search, web_search, youtube_search, WebClient,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// A resolved call to one of the registered tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Search the web.
    WebSearch { query: String, num_results: usize },

    /// Look up structured movie/TV information.
    MovieInfoSearch { query: String, num_results: usize },

    /// Search for videos on YouTube.
    YoutubeSearch { query: String, num_results: usize },

    /// Search for trailers on YouTube.
    MovieTrailerSearch { query: String, num_results: usize },
}

impl ToolCall {
    /// The registered tool name.
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::WebSearch { .. } => "web_search",
            ToolCall::MovieInfoSearch { .. } => "movie_info_search",
            ToolCall::YoutubeSearch { .. } => "youtube_search",
            ToolCall::MovieTrailerSearch { .. } => "movie_trailer_search",
        }
    }

    /// The resolved input arguments, for the invocation trace.
    pub fn input_value(&self) -> Value {
        let (query, num_results) = match self {
            ToolCall::WebSearch { query, num_results }
            | ToolCall::MovieInfoSearch { query, num_results }
            | ToolCall::YoutubeSearch { query, num_results }
            | ToolCall::MovieTrailerSearch { query, num_results } => (query, num_results),
        };
        json!({ "query": query, "num_results": num_results })
    }
}

/// Tool execution context holding the shared web client.
pub struct ToolContext {
    web: Arc<dyn WebClient>,
}

impl ToolContext {
    pub fn new(web: Arc<dyn WebClient>) -> Self {
        Self { web }
    }

    /// Execute a tool call, converting any failure into an error payload.
    ///
    /// List-shaped tools degrade to a single-element error list, the movie
    /// lookup to an error object, matching the payloads consumers expect.
    pub async fn execute(&self, tool: &ToolCall) -> Value {
        let web = self.web.as_ref();

        match tool {
            ToolCall::WebSearch { query, num_results } => {
                match web_search(web, query, *num_results).await {
                    Ok(results) => to_value(results),
                    Err(e) => json!([{ "error": format!("Error during web search: {}", e) }]),
                }
            }
            ToolCall::MovieInfoSearch { query, num_results } => {
                match movie_info_search(web, query, *num_results).await {
                    Ok(record) => to_value(record),
                    Err(e) => {
                        json!({ "error": format!("Error during movie info search: {}", e) })
                    }
                }
            }
            ToolCall::YoutubeSearch { query, num_results } => {
                match youtube_search(web, query, *num_results).await {
                    Ok(videos) => to_value(videos),
                    Err(e) => json!([{ "error": format!("Error during YouTube search: {}", e) }]),
                }
            }
            ToolCall::MovieTrailerSearch { query, num_results } => {
                match movie_trailer_search(web, query, *num_results).await {
                    Ok(videos) => to_value(videos),
                    Err(e) => {
                        json!([{ "error": format!("Error during movie trailer search: {}", e) }])
                    }
                }
            }
        }
    }
}

fn to_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Get OpenAI function/tool definitions for the agent.
pub fn tool_definitions() -> Vec<async_openai::types::ChatCompletionTool> {
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

    let with_query = |description: &str, default_results: usize| FunctionObject {
        name: String::new(),
        description: Some(description.to_string()),
        parameters: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to use"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of search results to return",
                    "default": default_results
                }
            },
            "required": ["query"]
        })),
        strict: None,
    };

    let mut definitions = vec![
        (
            "web_search",
            with_query("Search for information on the web.", 5),
        ),
        (
            "movie_info_search",
            with_query(
                "Search for specific information about a movie or TV show \
                (title, year, rating, etc.).",
                3,
            ),
        ),
        (
            "youtube_search",
            with_query("Search for videos on YouTube based on a query.", 1),
        ),
        (
            "movie_trailer_search",
            with_query(
                "Search for trailers of specific movies or TV shows on YouTube.",
                1,
            ),
        ),
    ];

    definitions
        .drain(..)
        .map(|(name, mut function)| {
            function.name = name.to_string();
            ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function,
            }
        })
        .collect()
}

/// Parse a model-requested tool call into a typed `ToolCall`.
///
/// `num_results` defaults come from the search settings when the model
/// omits the argument.
pub fn parse_tool_call(name: &str, arguments: &str, defaults: &SearchSettings) -> Result<ToolCall> {
    let args: Value = serde_json::from_str(arguments)
        .map_err(|e| KinoError::Model(format!("Invalid tool arguments: {}", e)))?;

    let query = args["query"]
        .as_str()
        .ok_or_else(|| KinoError::Model("Missing 'query' argument".to_string()))?
        .to_string();

    let num_results = |default: usize| {
        args["num_results"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(default)
    };

    match name {
        "web_search" => Ok(ToolCall::WebSearch {
            query,
            num_results: num_results(defaults.web_results),
        }),
        "movie_info_search" => Ok(ToolCall::MovieInfoSearch {
            query,
            num_results: num_results(defaults.movie_results),
        }),
        "youtube_search" => Ok(ToolCall::YoutubeSearch {
            query,
            num_results: num_results(defaults.video_results),
        }),
        "movie_trailer_search" => Ok(ToolCall::MovieTrailerSearch {
            query,
            num_results: num_results(defaults.video_results),
        }),
        _ => Err(KinoError::Model(format!("Unknown tool: {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_web_search_with_explicit_count() {
        let tool = parse_tool_call(
            "web_search",
            r#"{"query": "oscar winners", "num_results": 10}"#,
            &SearchSettings::default(),
        )
        .unwrap();
        match tool {
            ToolCall::WebSearch { query, num_results } => {
                assert_eq!(query, "oscar winners");
                assert_eq!(num_results, 10);
            }
            _ => panic!("Expected WebSearch tool"),
        }
    }

    #[test]
    fn test_parse_defaults_come_from_settings() {
        let defaults = SearchSettings::default();

        let tool = parse_tool_call("movie_info_search", r#"{"query": "Dune"}"#, &defaults).unwrap();
        match tool {
            ToolCall::MovieInfoSearch { num_results, .. } => {
                assert_eq!(num_results, defaults.movie_results);
            }
            _ => panic!("Expected MovieInfoSearch tool"),
        }

        let tool =
            parse_tool_call("movie_trailer_search", r#"{"query": "Dune"}"#, &defaults).unwrap();
        match tool {
            ToolCall::MovieTrailerSearch { num_results, .. } => {
                assert_eq!(num_results, defaults.video_results);
            }
            _ => panic!("Expected MovieTrailerSearch tool"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_tool_and_missing_query() {
        let defaults = SearchSettings::default();
        assert!(parse_tool_call("delete_files", r#"{"query": "x"}"#, &defaults).is_err());
        assert!(parse_tool_call("web_search", r#"{"limit": 3}"#, &defaults).is_err());
        assert!(parse_tool_call("web_search", "not json", &defaults).is_err());
    }

    #[test]
    fn test_tool_definitions_cover_catalog() {
        let definitions = tool_definitions();
        let names: Vec<&str> = definitions
            .iter()
            .map(|d| d.function.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "web_search",
                "movie_info_search",
                "youtube_search",
                "movie_trailer_search"
            ]
        );
    }

    #[test]
    fn test_input_value_records_resolved_arguments() {
        let tool = ToolCall::YoutubeSearch {
            query: "cats".to_string(),
            num_results: 2,
        };
        assert_eq!(tool.name(), "youtube_search");
        assert_eq!(
            tool.input_value(),
            serde_json::json!({"query": "cats", "num_results": 2})
        );
    }
}
