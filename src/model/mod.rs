//! Model turn API boundary.
//!
//! A [`ChatModel`] is one stateful chat: it remembers the history of the
//! conversation it was created for and answers one [`TurnInput`] at a time.

pub mod gemini;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::tools::ToolDeclaration;
use crate::types::{ToolInvocationRequest, ToolInvocationResult};

pub use gemini::{
    GeminiChat, GeminiChatFactory, ABANDONED_CALL_TEXT, DEFAULT_GEMINI_BASE_URL,
    DEFAULT_GEMINI_MODEL,
};

/// What the session sends to the model in one step.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnInput {
    /// A user message.
    Text(String),
    /// Results for tool calls the model requested, in request order.
    ToolResults(Vec<ToolInvocationResult>),
}

/// One model reply: optional text plus zero or more tool calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolInvocationRequest>,
}

impl ModelResponse {
    /// A text-only reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A reply made only of tool calls.
    pub fn calls(tool_calls: Vec<ToolInvocationRequest>) -> Self {
        Self {
            text: None,
            tool_calls,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn send(&self, input: TurnInput) -> Result<ModelResponse>;
}

/// Creates chats seeded with instructions and the tool catalog.
pub trait ChatModelFactory: Send + Sync {
    fn create_chat(
        &self,
        instructions: &str,
        tools: &[ToolDeclaration],
    ) -> Result<Arc<dyn ChatModel>>;
}
