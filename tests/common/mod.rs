//! Shared test helpers: a scripted chat model and a recording tool handler.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use compass::config::SessionConfig;
use compass::error::{CompassError, Result};
use compass::model::{ChatModel, ChatModelFactory, ModelResponse, TurnInput};
use compass::session::ConversationSession;
use compass::store::{AppState, InMemoryStateStore};
use compass::tools::{ToolDeclaration, ToolExecutor, ToolHandler};
use compass::types::{ToolInvocationRequest, ToolInvocationResult};

/// A chat that replays queued responses and records what it was sent.
#[derive(Default)]
pub struct ScriptedChat {
    responses: Mutex<VecDeque<Result<ModelResponse>>>,
    inputs: Mutex<Vec<TurnInput>>,
}

impl ScriptedChat {
    pub fn queue(&self, response: ModelResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_text(&self, text: &str) {
        self.queue(ModelResponse::text(text));
    }

    pub fn queue_calls(&self, calls: Vec<ToolInvocationRequest>) {
        self.queue(ModelResponse::calls(calls));
    }

    pub fn queue_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(CompassError::ModelTurn(message.to_string())));
    }

    pub fn inputs(&self) -> Vec<TurnInput> {
        self.inputs.lock().unwrap().clone()
    }

    /// Tool results from the `n`th input, panicking if it was text.
    pub fn results_at(&self, n: usize) -> Vec<ToolInvocationResult> {
        match &self.inputs()[n] {
            TurnInput::ToolResults(results) => results.clone(),
            other => panic!("expected tool results, got {other:?}"),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn send(&self, input: TurnInput) -> Result<ModelResponse> {
        self.inputs.lock().unwrap().push(input);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ModelResponse::text("Mock response")))
    }
}

/// Factory handing out one shared [`ScriptedChat`] and recording instructions.
#[derive(Default)]
pub struct ScriptedFactory {
    pub chat: Arc<ScriptedChat>,
    pub instructions: Mutex<Vec<String>>,
}

impl ChatModelFactory for ScriptedFactory {
    fn create_chat(
        &self,
        instructions: &str,
        _tools: &[ToolDeclaration],
    ) -> Result<Arc<dyn ChatModel>> {
        self.instructions
            .lock()
            .unwrap()
            .push(instructions.to_string());
        Ok(self.chat.clone())
    }
}

/// Delegates to the real executor and records the name of every executed call.
pub struct RecordingHandler {
    inner: ToolExecutor,
    executed: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn new(inner: ToolExecutor) -> Self {
        Self {
            inner,
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolHandler for RecordingHandler {
    async fn execute(&self, request: &ToolInvocationRequest) -> ToolInvocationResult {
        self.executed.lock().unwrap().push(request.name.clone());
        self.inner.execute(request).await
    }
}

pub struct Harness {
    pub session: ConversationSession,
    pub factory: ScriptedFactory,
    pub store: Arc<InMemoryStateStore>,
    pub handler: Arc<RecordingHandler>,
}

impl Harness {
    pub fn chat(&self) -> &ScriptedChat {
        &self.factory.chat
    }
}

pub fn harness(state: AppState) -> Harness {
    harness_with(state, SessionConfig::default())
}

pub fn harness_with(state: AppState, config: SessionConfig) -> Harness {
    let store = Arc::new(InMemoryStateStore::new(state));
    let handler = Arc::new(RecordingHandler::new(ToolExecutor::new(store.clone())));
    let factory = ScriptedFactory::default();
    let session = ConversationSession::start(&factory, handler.clone(), "test instructions", config)
        .expect("session should start");
    Harness {
        session,
        factory,
        store,
        handler,
    }
}

pub fn call(id: &str, name: &str, args: serde_json::Value) -> ToolInvocationRequest {
    ToolInvocationRequest::new(id, name, args)
}
