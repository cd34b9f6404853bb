//! Chat model boundary.
//!
//! The agent talks to the model through the `ChatModel` trait: given the
//! conversation so far and the tool catalog, the model either requests tool
//! calls or produces final text. Tests substitute a scripted implementation.

use crate::error::{KinoError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
};
use async_trait::async_trait;

/// A model-requested tool call.
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    /// Provider-assigned call id, echoed back with the tool result.
    pub id: String,
    pub name: String,
    /// Raw JSON argument string as emitted by the model.
    pub arguments: String,
}

/// The model's next step: call tools or finish with text.
#[derive(Debug, Clone)]
pub enum ModelAction {
    ToolCalls(Vec<ToolCallRequest>),
    Final(String),
}

/// One message in the model's context window.
#[derive(Debug, Clone)]
pub enum Message {
    System(String),
    User(String),
    Assistant(String),
    /// Assistant turn that requested tool calls.
    ToolRequests(Vec<ToolCallRequest>),
    /// Result of one tool call, keyed by the request's call id.
    ToolResult { call_id: String, content: String },
}

/// Capability to propose the next action given conversation + tool catalog.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn next_action(
        &self,
        messages: &[Message],
        tools: &[ChatCompletionTool],
    ) -> Result<ModelAction>;
}

/// OpenAI chat-completions implementation of the model boundary.
pub struct OpenAiModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiModel {
    pub fn new(api_key: &str, model: &str, temperature: f32) -> Self {
        Self {
            client: create_client(api_key),
            model: model.to_string(),
            temperature,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiModel {
    async fn next_action(
        &self,
        messages: &[Message],
        tools: &[ChatCompletionTool],
    ) -> Result<ModelAction> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(to_request_messages(messages)?)
            .tools(tools.to_vec())
            .temperature(self.temperature)
            .build()
            .map_err(|e| KinoError::Model(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| KinoError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| KinoError::Model("No response from model".to_string()))?;

        if let Some(tool_calls) = &choice.message.tool_calls {
            if !tool_calls.is_empty() {
                let requests = tool_calls
                    .iter()
                    .map(|call| ToolCallRequest {
                        id: call.id.clone(),
                        name: call.function.name.clone(),
                        arguments: call.function.arguments.clone(),
                    })
                    .collect();
                return Ok(ModelAction::ToolCalls(requests));
            }
        }

        Ok(ModelAction::Final(
            choice.message.content.clone().unwrap_or_default(),
        ))
    }
}

/// Convert the agent's message history into OpenAI request messages.
fn to_request_messages(messages: &[Message]) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut converted = Vec::with_capacity(messages.len());

    for message in messages {
        let request_message: ChatCompletionRequestMessage = match message {
            Message::System(content) => ChatCompletionRequestSystemMessageArgs::default()
                .content(content.clone())
                .build()
                .map_err(|e| KinoError::Model(e.to_string()))?
                .into(),
            Message::User(content) => ChatCompletionRequestUserMessageArgs::default()
                .content(content.clone())
                .build()
                .map_err(|e| KinoError::Model(e.to_string()))?
                .into(),
            Message::Assistant(content) => ChatCompletionRequestAssistantMessageArgs::default()
                .content(content.clone())
                .build()
                .map_err(|e| KinoError::Model(e.to_string()))?
                .into(),
            Message::ToolRequests(calls) => {
                let tool_calls: Vec<ChatCompletionMessageToolCall> = calls
                    .iter()
                    .map(|call| ChatCompletionMessageToolCall {
                        id: call.id.clone(),
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                    .collect();
                ChatCompletionRequestAssistantMessageArgs::default()
                    .tool_calls(tool_calls)
                    .build()
                    .map_err(|e| KinoError::Model(e.to_string()))?
                    .into()
            }
            Message::ToolResult { call_id, content } => {
                ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(call_id.clone())
                    .content(content.clone())
                    .build()
                    .map_err(|e| KinoError::Model(e.to_string()))?
                    .into()
            }
        };
        converted.push(request_message);
    }

    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_request_messages_covers_all_variants() {
        let messages = vec![
            Message::System("system".to_string()),
            Message::User("question".to_string()),
            Message::ToolRequests(vec![ToolCallRequest {
                id: "call_1".to_string(),
                name: "web_search".to_string(),
                arguments: r#"{"query":"q"}"#.to_string(),
            }]),
            Message::ToolResult {
                call_id: "call_1".to_string(),
                content: r#"{"results":[]}"#.to_string(),
            },
            Message::Assistant("answer".to_string()),
        ];

        let converted = to_request_messages(&messages).unwrap();
        assert_eq!(converted.len(), 5);
    }
}
