//! Agent system for answering movie and TV show queries with tool calling.
//!
//! The runner drives a select-action/execute-tool loop against a chat model,
//! records every tool invocation as an ordered trace, and hands the result to
//! the response composer.

mod model;
mod runner;
mod tools;

pub use model::{ChatModel, Message, ModelAction, OpenAiModel, ToolCallRequest};
pub use runner::{normalize_output, Agent};
pub use tools::{parse_tool_call, tool_definitions, ToolCall, ToolContext};
