use serde_json::Value;

use crate::llm::tools::ToolCall;
use crate::scanner::ToolRecord;

/// Assistant message returned by chat models.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AIMessage {
    /// Natural language content.
    pub content: String,
    /// Optional tool call requests emitted by the model.
    pub tool_calls: Vec<ToolCall>,
}

impl AIMessage {
    /// The assistant's own entry in a tool-execution transcript.
    pub fn to_record(&self) -> ToolRecord {
        ToolRecord {
            role: "assistant".to_string(),
            content: Some(self.content.clone())
                .filter(|content| !content.is_empty())
                .map(Value::String),
            tool_call_id: None,
        }
    }
}
