//! Agent runner: the tool-calling loop and per-query orchestration.
//!
//! `process` never returns an error: every fault inside the loop is
//! converted into an answer turn, with whatever trace was accumulated
//! preserved.

use super::model::{ChatModel, Message, ModelAction, OpenAiModel};
#[cfg(test)]
use super::model::ToolCallRequest;
use super::tools::{parse_tool_call, tool_definitions, ToolContext};
use crate::compose::compose_answer;
use crate::config::{SearchSettings, Settings};
use crate::conversation::{Conversation, QueryResult, Role, ToolInvocation, Turn};
use crate::error::{KinoError, Result};
use crate::lookup::HttpWebClient;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// System prompt for the movie assistant.
const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful movie and TV show information assistant. You can search the web for information, find specific details about movies and TV shows, and search for trailers on YouTube.

When asked about a movie or TV show:
1. First use the movie_info_search tool to get basic information about the title
2. Then use the movie_trailer_search tool to find relevant trailers
3. Combine the information and present it in a well-structured format

For general queries, use the appropriate search tools and provide helpful, concise answers.

Always be polite and helpful. If you don't know something, say so and offer to search for it."#;

/// Unparseable model actions tolerated before a degraded finish.
const MAX_PROTOCOL_ERRORS: usize = 2;

/// Movie research agent: owns its conversation history and drives the
/// select-action/execute-tool loop for each query.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: ToolContext,
    defaults: SearchSettings,
    max_iterations: usize,
    system_prompt: String,
    conversation: Conversation,
}

impl Agent {
    /// Construct an agent from settings.
    ///
    /// Fails up front with a configuration error when no API key is
    /// available; no query is ever processed without a credential.
    pub fn new(settings: &Settings) -> Result<Self> {
        let api_key = settings.api_key()?;
        let model = Arc::new(OpenAiModel::new(
            &api_key,
            &settings.llm.model,
            settings.llm.temperature,
        ));
        let web = Arc::new(HttpWebClient::new(Duration::from_secs(
            settings.search.timeout_seconds,
        )));

        Ok(Self::with_parts(
            model,
            ToolContext::new(web),
            settings.search.clone(),
            settings.llm.max_iterations,
        ))
    }

    /// Construct an agent from explicit parts (used by tests to substitute
    /// a scripted model and a stub web client).
    pub fn with_parts(
        model: Arc<dyn ChatModel>,
        tools: ToolContext,
        defaults: SearchSettings,
        max_iterations: usize,
    ) -> Self {
        Self {
            model,
            tools,
            defaults,
            max_iterations,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            conversation: Conversation::new(),
        }
    }

    /// Set a custom system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// The conversation history, traces attached to their owning turns.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Reset the conversation, discarding all turns and traces.
    pub fn clear(&mut self) {
        self.conversation.clear();
    }

    /// Process one user query.
    ///
    /// Appends the human turn, runs the loop, composes the answer, and
    /// appends the ai turn with its trace. Faults become answer text.
    pub async fn process(&mut self, query: &str) -> QueryResult {
        self.conversation.append(Turn::human(query));

        let mut trace = Vec::new();
        let answer = match self.run_loop(&mut trace).await {
            Ok(text) => compose_answer(query, &text, &trace),
            Err(e) => {
                warn!("Query processing failed: {}", e);
                format!(
                    "I encountered an error while processing your request: {}",
                    e
                )
            }
        };

        self.conversation.append(Turn::ai(&answer, trace.clone()));

        QueryResult {
            query: query.to_string(),
            answer,
            tool_calls: trace,
        }
    }

    /// The select-action/execute-tool loop for the current query.
    async fn run_loop(&self, trace: &mut Vec<ToolInvocation>) -> Result<String> {
        let mut messages = self.context_messages();
        let definitions = tool_definitions();
        let mut protocol_errors = 0;

        for iteration in 1..=self.max_iterations {
            debug!("Agent iteration {}, {} messages", iteration, messages.len());

            let action = match self.model.next_action(&messages, &definitions).await {
                Ok(action) => action,
                Err(KinoError::Model(e)) => {
                    // Unparseable action: retry with unchanged context,
                    // bounded by the protocol error budget.
                    warn!("Model protocol error: {}", e);
                    protocol_errors += 1;
                    if protocol_errors > MAX_PROTOCOL_ERRORS {
                        return Ok(self.degraded_answer(trace));
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };

            match action {
                ModelAction::Final(text) => return Ok(text),
                ModelAction::ToolCalls(calls) => {
                    messages.push(Message::ToolRequests(calls.clone()));

                    for call in &calls {
                        match parse_tool_call(&call.name, &call.arguments, &self.defaults) {
                            Ok(tool) => {
                                info!("Calling tool: {} with args: {}", call.name, call.arguments);
                                let raw = self.tools.execute(&tool).await;
                                let output = normalize_output(raw);
                                messages.push(Message::ToolResult {
                                    call_id: call.id.clone(),
                                    content: output.to_string(),
                                });
                                trace.push(ToolInvocation {
                                    tool: tool.name().to_string(),
                                    input: tool.input_value(),
                                    output,
                                });
                            }
                            Err(e) => {
                                // Bad call from the model: feed the error
                                // back instead of recording an invocation.
                                warn!("Rejected tool call '{}': {}", call.name, e);
                                protocol_errors += 1;
                                messages.push(Message::ToolResult {
                                    call_id: call.id.clone(),
                                    content: format!("Failed to parse tool call: {}", e),
                                });
                                if protocol_errors > MAX_PROTOCOL_ERRORS {
                                    return Ok(self.degraded_answer(trace));
                                }
                            }
                        }
                    }
                }
            }
        }

        Ok(self.degraded_answer(trace))
    }

    /// Build the model context: system prompt plus the full conversation,
    /// the just-appended human turn last.
    fn context_messages(&self) -> Vec<Message> {
        let mut messages = vec![Message::System(self.system_prompt.clone())];
        for turn in self.conversation.all() {
            messages.push(match turn.role {
                Role::Human => Message::User(turn.content.clone()),
                Role::Ai => Message::Assistant(turn.content.clone()),
            });
        }
        messages
    }

    /// Apology answer for a degraded finish, built from whatever the trace
    /// gathered.
    fn degraded_answer(&self, trace: &[ToolInvocation]) -> String {
        if trace.is_empty() {
            return "I'm sorry, I couldn't process your request.".to_string();
        }

        let mut tools: Vec<&str> = Vec::new();
        for call in trace {
            if !tools.contains(&call.tool.as_str()) {
                tools.push(&call.tool);
            }
        }
        format!(
            "I'm sorry, I couldn't finish processing your request. \
            I gathered partial results from: {}.",
            tools.join(", ")
        )
    }
}

/// Normalize a raw tool output into a JSON mapping.
///
/// Strings are JSON-decoded when possible, bare sequences are wrapped under
/// `results`, anything else under `raw_output`. Undecodable strings are kept
/// verbatim under `raw_output` with no error marker: the text may still be
/// useful to the model, and error payloads are reserved for tool failures.
pub fn normalize_output(raw: Value) -> Value {
    match raw {
        Value::Object(map) => Value::Object(map),
        Value::Array(items) => json!({ "results": items }),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Value::Object(map),
            Ok(Value::Array(items)) => json!({ "results": items }),
            _ => json!({ "raw_output": text }),
        },
        other => json!({ "raw_output": other }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::WebClient;
    use async_trait::async_trait;
    use async_openai::types::ChatCompletionTool;
    use std::sync::Mutex;

    /// Model double that replays a fixed script of actions.
    struct ScriptedModel {
        script: Mutex<Vec<ModelAction>>,
    }

    impl ScriptedModel {
        fn new(script: Vec<ModelAction>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script),
            })
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn next_action(
            &self,
            _messages: &[Message],
            _tools: &[ChatCompletionTool],
        ) -> Result<ModelAction> {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                // Scripts that run out keep requesting the same tool so the
                // iteration ceiling is reachable.
                return Ok(ModelAction::ToolCalls(vec![tool_request(
                    "web_search",
                    r#"{"query": "again"}"#,
                )]));
            }
            Ok(script.remove(0))
        }
    }

    struct FailingWeb;

    #[async_trait]
    impl WebClient for FailingWeb {
        async fn get(&self, _url: &str) -> Result<String> {
            Err(KinoError::Agent("connection refused".to_string()))
        }
    }

    fn tool_request(name: &str, arguments: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: format!("call_{}", name),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    fn test_agent(script: Vec<ModelAction>, max_iterations: usize) -> Agent {
        Agent::with_parts(
            ScriptedModel::new(script),
            ToolContext::new(Arc::new(FailingWeb)),
            SearchSettings::default(),
            max_iterations,
        )
    }

    #[tokio::test]
    async fn test_direct_answer_has_empty_trace() {
        let mut agent = test_agent(vec![ModelAction::Final("Paris.".to_string())], 10);
        let result = agent.process("capital of France?").await;

        assert_eq!(result.answer, "Paris.");
        assert!(result.tool_calls.is_empty());
        assert_eq!(agent.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_tool_degrades_to_error_payload() {
        let mut agent = test_agent(
            vec![
                ModelAction::ToolCalls(vec![tool_request(
                    "web_search",
                    r#"{"query": "anything"}"#,
                )]),
                ModelAction::Final("done".to_string()),
            ],
            10,
        );

        let result = agent.process("look something up").await;

        assert_eq!(result.answer, "done");
        assert_eq!(result.tool_calls.len(), 1);
        assert_eq!(result.tool_calls[0].tool, "web_search");
        let first = &result.tool_calls[0].output["results"][0];
        assert!(first["error"]
            .as_str()
            .unwrap()
            .starts_with("Error during web search:"));
    }

    #[tokio::test]
    async fn test_iteration_ceiling_produces_degraded_answer() {
        // Empty script: the model keeps requesting web_search forever.
        let mut agent = test_agent(vec![], 3);
        let result = agent.process("loop forever").await;

        assert!(result.answer.starts_with("I'm sorry"));
        assert!(result.answer.contains("web_search"));
        assert_eq!(result.tool_calls.len(), 3);
    }

    #[tokio::test]
    async fn test_unparseable_tool_calls_hit_protocol_budget() {
        let bad_call = || {
            ModelAction::ToolCalls(vec![tool_request("not_a_tool", r#"{"query": "x"}"#)])
        };
        let mut agent = test_agent(vec![bad_call(), bad_call(), bad_call()], 10);
        let result = agent.process("misbehave").await;

        // Rejected calls are never recorded as invocations.
        assert!(result.tool_calls.is_empty());
        assert!(result.answer.starts_with("I'm sorry"));
    }

    #[tokio::test]
    async fn test_clear_discards_history_and_traces() {
        let mut agent = test_agent(
            vec![
                ModelAction::ToolCalls(vec![tool_request("web_search", r#"{"query": "a"}"#)]),
                ModelAction::Final("first".to_string()),
                ModelAction::Final("second".to_string()),
            ],
            10,
        );

        let first = agent.process("movie question one").await;
        assert_eq!(first.tool_calls.len(), 1);

        agent.clear();
        assert!(agent.conversation().all().is_empty());

        let second = agent.process("another question").await;
        assert!(second.tool_calls.is_empty());
        assert_eq!(agent.conversation().len(), 2);
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(
            normalize_output(Value::String(r#"{"a":1}"#.to_string())),
            json!({"a": 1})
        );
        assert_eq!(
            normalize_output(Value::String("plain text".to_string())),
            json!({"raw_output": "plain text"})
        );
        assert_eq!(normalize_output(json!([1, 2, 3])), json!({"results": [1, 2, 3]}));
        assert_eq!(normalize_output(json!({"k": "v"})), json!({"k": "v"}));
        assert_eq!(normalize_output(json!(42)), json!({"raw_output": 42}));
    }
}
