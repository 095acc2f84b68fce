//! One image-generation round-trip per room change.
//!
//! The designer asks the chat model for a completion with the bundle's tools
//! attached, runs whatever tool calls come back, and pulls the generated
//! image URLs out of the tool records.

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

use crate::llm::ai::AIMessage;
use crate::llm::error::ServiceError;
use crate::llm::openai::{ChatMessage, OpenAiChat};
use crate::llm::toolhouse::ToolhouseClient;
use crate::scanner::{ToolRecord, TracingSink, extract_image_urls};
use crate::session::{RoomSession, SessionRule};

#[derive(Debug, Error)]
pub enum DesignError {
    #[error(transparent)]
    Rule(#[from] SessionRule),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("No image URLs found in the tool response.")]
    NoImages,
}

/// Chat model able to answer with tool calls.
pub trait ChatBackend {
    fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> impl Future<Output = Result<AIMessage, ServiceError>> + Send;
}

/// Tool-execution service.
pub trait ToolRunner {
    fn tool_schemas(&self) -> impl Future<Output = Result<Vec<Value>, ServiceError>> + Send;

    fn run_tools(
        &self,
        message: &AIMessage,
    ) -> impl Future<Output = Result<Vec<ToolRecord>, ServiceError>> + Send;
}

impl ChatBackend for OpenAiChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<AIMessage, ServiceError> {
        self.complete_with_tools(messages, tools).await
    }
}

impl ToolRunner for ToolhouseClient {
    async fn tool_schemas(&self) -> Result<Vec<Value>, ServiceError> {
        self.get_tools().await
    }

    async fn run_tools(&self, message: &AIMessage) -> Result<Vec<ToolRecord>, ServiceError> {
        ToolhouseClient::run_tools(self, message).await
    }
}

pub struct RoomDesigner<C, T> {
    chat: C,
    tools: T,
}

impl<C: ChatBackend, T: ToolRunner> RoomDesigner<C, T> {
    pub fn new(chat: C, tools: T) -> Self {
        Self { chat, tools }
    }

    /// Generates images for `prompt`. An empty result is an error.
    pub async fn generate(&self, prompt: &str) -> Result<Vec<String>, DesignError> {
        let messages = [ChatMessage::user(prompt)];
        let schemas = self.tools.tool_schemas().await?;
        tracing::debug!(tools = schemas.len(), "fetched tool schemas");

        let reply = self.chat.complete(&messages, &schemas).await?;
        tracing::debug!(tool_calls = reply.tool_calls.len(), "chat completion received");

        let records = self.tools.run_tools(&reply).await?;
        let urls = extract_image_urls(&records, &mut TracingSink);
        tracing::debug!(records = records.len(), images = urls.len(), "scanned tool records");

        if urls.is_empty() {
            return Err(DesignError::NoImages);
        }
        Ok(urls)
    }

    /// Starts a new room and renders it.
    pub async fn initialize_room(
        &self,
        session: &mut RoomSession,
        description: &str,
    ) -> Result<Vec<String>, DesignError> {
        session.initialize(description)?;
        let urls = self.generate(description).await?;
        session.set_images(urls.clone());
        Ok(urls)
    }

    /// Adds a component and re-renders the whole room. The component stays
    /// in the session even when rendering fails.
    pub async fn update_room(
        &self,
        session: &mut RoomSession,
        component: &str,
    ) -> Result<Vec<String>, DesignError> {
        session.add_component(component)?;
        let urls = self.generate(&session.cumulative_description()).await?;
        session.set_images(urls.clone());
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::tools::ToolCall;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::Mutex;

    use crate::llm::error::Service;

    #[derive(Default)]
    struct FakeChat {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl ChatBackend for FakeChat {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            tools: &[Value],
        ) -> Result<AIMessage, ServiceError> {
            assert_eq!(tools.len(), 1);
            self.prompts
                .lock()
                .expect("lock should not be poisoned")
                .push(messages[0].content.clone());
            if self.fail {
                return Err(ServiceError::Api {
                    service: Service::Chat,
                    status: StatusCode::BAD_GATEWAY,
                    body: "upstream down".to_string(),
                });
            }
            Ok(AIMessage {
                content: String::new(),
                tool_calls: vec![ToolCall {
                    id: "call_1".to_string(),
                    name: "generate_image".to_string(),
                    args: json!({"prompt": messages[0].content}),
                }],
            })
        }
    }

    struct FakeTools {
        results: Vec<String>,
    }

    impl FakeTools {
        fn returning(results: &[&str]) -> Self {
            Self {
                results: results.iter().map(|r| r.to_string()).collect(),
            }
        }
    }

    impl ToolRunner for FakeTools {
        async fn tool_schemas(&self) -> Result<Vec<Value>, ServiceError> {
            Ok(vec![json!({"type": "function", "function": {"name": "generate_image"}})])
        }

        async fn run_tools(&self, message: &AIMessage) -> Result<Vec<ToolRecord>, ServiceError> {
            let mut records = vec![message.to_record()];
            for (call, result) in message.tool_calls.iter().zip(&self.results) {
                records.push(ToolRecord::tool_result(&call.id, result.as_str()));
            }
            Ok(records)
        }
    }

    #[tokio::test]
    async fn initialize_room_stores_generated_images() {
        let designer = RoomDesigner::new(
            FakeChat::default(),
            FakeTools::returning(&[r#"{"result":"![room](https://img.example.com/1.png)"}"#]),
        );
        let mut session = RoomSession::default();

        let urls = designer
            .initialize_room(&mut session, "a cozy bedroom")
            .await
            .expect("initialization should succeed");

        assert_eq!(urls, vec!["https://img.example.com/1.png"]);
        assert_eq!(session.images, urls);
        assert_eq!(session.description, "a cozy bedroom");
    }

    #[tokio::test]
    async fn update_room_prompts_with_cumulative_description() {
        let chat = FakeChat::default();
        let designer = RoomDesigner::new(
            chat,
            FakeTools::returning(&[r#"{"result":"![room](https://img.example.com/2.png)"}"#]),
        );
        let mut session = RoomSession::default();
        session.initialize("a bedroom").expect("description is valid");
        session.add_component("desk").expect("component is valid");

        designer
            .update_room(&mut session, "green plant")
            .await
            .expect("update should succeed");

        let prompts = designer.chat.prompts.lock().expect("lock should not be poisoned");
        assert_eq!(*prompts, vec!["a bedroom desk green plant"]);
        assert_eq!(session.images, vec!["https://img.example.com/2.png"]);
    }

    #[tokio::test]
    async fn missing_images_is_reported_and_keeps_previous_set() {
        let designer = RoomDesigner::new(
            FakeChat::default(),
            FakeTools::returning(&[r#"{"result":"no picture this time ![x](nope)"}"#]),
        );
        let mut session = RoomSession::default();
        session.initialize("a bedroom").expect("description is valid");
        session.set_images(vec!["https://img.example.com/old.png".to_string()]);

        let err = designer
            .update_room(&mut session, "desk")
            .await
            .expect_err("no images should be an error");

        assert!(matches!(err, DesignError::NoImages));
        assert_eq!(session.components, vec!["desk"]);
        assert_eq!(session.images, vec!["https://img.example.com/old.png"]);
    }

    #[tokio::test]
    async fn malformed_tool_output_is_skipped_not_fatal() {
        let designer = RoomDesigner::new(
            FakeChat::default(),
            FakeTools::returning(&["not-json"]),
        );

        let err = designer
            .generate("a bedroom")
            .await
            .expect_err("only malformed output should yield no images");

        assert!(matches!(err, DesignError::NoImages));
    }

    #[tokio::test]
    async fn service_failure_keeps_component_recorded() {
        let designer = RoomDesigner::new(
            FakeChat {
                fail: true,
                ..FakeChat::default()
            },
            FakeTools::returning(&[]),
        );
        let mut session = RoomSession::default();
        session.initialize("a bedroom").expect("description is valid");

        let err = designer
            .update_room(&mut session, "desk")
            .await
            .expect_err("chat failure should propagate");

        assert!(err.to_string().contains("chat API error 502"));
        assert_eq!(session.components, vec!["desk"]);
    }

    #[tokio::test]
    async fn session_rules_are_checked_before_any_request() {
        let designer = RoomDesigner::new(FakeChat::default(), FakeTools::returning(&[]));
        let mut session = RoomSession::default();

        let err = designer
            .update_room(&mut session, "desk")
            .await
            .expect_err("uninitialized room should be rejected");

        assert_eq!(err.to_string(), "Please initialize the room first.");
        assert!(designer.chat.prompts.lock().expect("lock").is_empty());
    }
}
