use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::ai::AIMessage;
use crate::llm::chat_runtime::{RetryConfig, post_json_with_retry, read_json};
use crate::llm::error::{Service, ServiceError, api_key};
use crate::llm::tools::parse_tool_calls;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "<[Value]>::is_empty")]
    tools: &'a [Value],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Value,
}

/// Chat-completions client for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    model: String,
    endpoint: String,
    api_key: String,
    retry: RetryConfig,
    client: reqwest::Client,
}

impl OpenAiChat {
    /// Builds a client using `OPENAI_API_KEY` from the environment.
    pub fn from_env(
        model: impl Into<String>,
        base_url: &str,
        retry: RetryConfig,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            model: model.into(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key(Service::Chat)?,
            retry,
            client: reqwest::Client::new(),
        })
    }

    /// Requests one completion offering `tools` to the model.
    pub async fn complete_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<AIMessage, ServiceError> {
        let service = Service::Chat;
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages,
            tools,
        };

        let response = post_json_with_retry(
            &self.client,
            service,
            &self.endpoint,
            &self.api_key,
            &payload,
            self.retry,
        )
        .await?;

        let body: ChatCompletionResponse = read_json(service, response).await?;
        let message = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ServiceError::Malformed {
                service,
                detail: "response did not contain any choices".to_string(),
            })?;

        Ok(AIMessage {
            content: message["content"].as_str().unwrap_or("").to_string(),
            tool_calls: parse_tool_calls(&message),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_omits_tools_when_none_are_offered() {
        let messages = [ChatMessage::user("a bedroom")];
        let payload = ChatCompletionRequest {
            model: "gpt-3.5-turbo",
            messages: &messages,
            tools: &[],
        };

        let body = serde_json::to_value(&payload).expect("request should serialize");

        assert_eq!(
            body,
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "a bedroom"}],
            })
        );
    }

    #[test]
    fn request_carries_tool_schemas() {
        let messages = [ChatMessage::user("a bedroom")];
        let tools = [json!({"type": "function", "function": {"name": "generate_image"}})];
        let payload = ChatCompletionRequest {
            model: "m",
            messages: &messages,
            tools: &tools,
        };

        let body = serde_json::to_value(&payload).expect("request should serialize");

        assert_eq!(body["tools"][0]["function"]["name"], "generate_image");
    }
}
