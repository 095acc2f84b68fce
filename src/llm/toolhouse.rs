use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::llm::ai::AIMessage;
use crate::llm::chat_runtime::{RetryConfig, post_json_with_retry, read_json};
use crate::llm::error::{Service, ServiceError, api_key};
use crate::scanner::ToolRecord;

pub const DEFAULT_TOOLHOUSE_BASE_URL: &str = "https://api.toolhouse.ai/v1";

/// Tool-call dialect the service formats schemas and results for.
const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
struct GetToolsRequest<'a> {
    provider: &'static str,
    metadata: Map<String, Value>,
    bundle: &'a str,
}

#[derive(Debug, Serialize)]
struct RunToolsRequest<'a> {
    content: Value,
    provider: &'static str,
    metadata: Map<String, Value>,
    bundle: &'a str,
}

#[derive(Debug, Deserialize)]
struct RunToolsResponse {
    content: ToolRecord,
}

/// Client for a Toolhouse-compatible tool-execution service.
#[derive(Debug, Clone)]
pub struct ToolhouseClient {
    base_url: String,
    bundle: String,
    api_key: String,
    retry: RetryConfig,
    client: reqwest::Client,
}

impl ToolhouseClient {
    /// Builds a client using `TOOLHOUSE_API_KEY` from the environment.
    pub fn from_env(
        base_url: &str,
        bundle: impl Into<String>,
        retry: RetryConfig,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bundle: bundle.into(),
            api_key: api_key(Service::Tools)?,
            retry,
            client: reqwest::Client::new(),
        })
    }

    /// Fetches the tool schemas of the configured bundle.
    pub async fn get_tools(&self) -> Result<Vec<Value>, ServiceError> {
        let service = Service::Tools;
        let payload = GetToolsRequest {
            provider: PROVIDER,
            metadata: Map::new(),
            bundle: &self.bundle,
        };

        let response = post_json_with_retry(
            &self.client,
            service,
            &format!("{}/get_tools", self.base_url),
            &self.api_key,
            &payload,
            self.retry,
        )
        .await?;

        match read_json::<Value>(service, response).await? {
            Value::Array(tools) => Ok(tools),
            other => Err(ServiceError::Malformed {
                service,
                detail: format!("expected a list of tools, got {other}"),
            }),
        }
    }

    /// Executes every tool call of `message`. The transcript starts with the
    /// assistant's record, followed by one record per call in call order.
    pub async fn run_tools(&self, message: &AIMessage) -> Result<Vec<ToolRecord>, ServiceError> {
        let service = Service::Tools;
        let endpoint = format!("{}/run_tools", self.base_url);
        let mut records = Vec::with_capacity(message.tool_calls.len() + 1);
        records.push(message.to_record());

        for call in &message.tool_calls {
            tracing::debug!(tool = %call.name, call_id = %call.id, "running tool");
            let payload = RunToolsRequest {
                content: call.to_json(),
                provider: PROVIDER,
                metadata: Map::new(),
                bundle: &self.bundle,
            };

            let response = post_json_with_retry(
                &self.client,
                service,
                &endpoint,
                &self.api_key,
                &payload,
                self.retry,
            )
            .await?;

            let body: RunToolsResponse = read_json(service, response).await?;
            records.push(body.content);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_tools_response_decodes_into_tool_record() {
        let raw = json!({
            "content": {
                "role": "tool",
                "tool_call_id": "call_1",
                "name": "generate_image",
                "content": "{\"result\":\"![room](https://img.example.com/r.png)\"}"
            }
        });

        let body: RunToolsResponse = serde_json::from_value(raw).expect("response should decode");

        assert_eq!(body.content.role, "tool");
        assert_eq!(body.content.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn get_tools_request_names_bundle_and_provider() {
        let payload = GetToolsRequest {
            provider: PROVIDER,
            metadata: Map::new(),
            bundle: "my-app",
        };

        let body = serde_json::to_value(&payload).expect("request should serialize");

        assert_eq!(
            body,
            json!({"provider": "openai", "metadata": {}, "bundle": "my-app"})
        );
    }
}
