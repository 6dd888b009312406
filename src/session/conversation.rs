//! The conversation state machine.
//!
//! ```text
//! Idle -> AwaitingModel -> Idle
//!                       -> AwaitingApproval -> AwaitingModel -> ...
//! ```
//!
//! Only `Idle` accepts user text and only `AwaitingApproval` accepts a
//! decision. Calls made in any other state are rejected, never queued.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::error::{CompassError, Result};
use crate::model::{ChatModel, ChatModelFactory, TurnInput};
use crate::tools::{declarations, ToolHandler};
use crate::types::{ApprovalDecision, ApprovalState, Message, ToolInvocationResult};

use super::events::{SessionEvent, SessionEventSink};
use super::processor::{ProcessedTurn, TurnProcessor};

/// Synthetic error returned to the model for each call the user denied.
pub const DENIED_TEXT: &str = "User denied action";
/// Prefix of the transcript message shown when a turn fails in transport.
pub const CONNECTION_ERROR_TEXT: &str = "Error: Connection interrupted.";
const INSTRUCTIONS_UPDATED_TEXT: &str = "System instructions updated.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum TurnState {
    Idle,
    AwaitingModel,
    AwaitingApproval,
}

/// Where a send or resolve call left the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered without pending calls; the session is idle.
    Settled,
    /// Mutating calls wait for a decision on `message_id`.
    AwaitingApproval { message_id: String },
    /// The model call failed; an error message was appended and the session is idle.
    Failed { error: String },
}

struct Inner {
    transcript: Vec<Message>,
    turn_state: TurnState,
    pending: Option<String>,
    chat: Arc<dyn ChatModel>,
}

pub struct ConversationSession {
    inner: Mutex<Inner>,
    handler: Arc<dyn ToolHandler>,
    processor: TurnProcessor,
    config: SessionConfig,
    state_tx: watch::Sender<TurnState>,
    events: Option<SessionEventSink>,
}

impl std::fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ConversationSession")
            .field("turn_state", &inner.turn_state)
            .field("messages", &inner.transcript.len())
            .field("pending", &inner.pending)
            .finish()
    }
}

impl ConversationSession {
    /// Create a chat seeded with `instructions` and greet the user.
    pub fn start(
        factory: &dyn ChatModelFactory,
        handler: Arc<dyn ToolHandler>,
        instructions: &str,
        config: SessionConfig,
    ) -> Result<Self> {
        let chat = factory.create_chat(instructions, declarations())?;
        let (state_tx, _) = watch::channel(TurnState::Idle);
        info!(tools = declarations().len(), "conversation session started");
        Ok(Self {
            inner: Mutex::new(Inner {
                transcript: vec![Message::model(config.greeting.clone(), Vec::new())],
                turn_state: TurnState::Idle,
                pending: None,
                chat,
            }),
            processor: TurnProcessor::new(handler.clone(), config.max_suggestions),
            handler,
            config,
            state_tx,
            events: None,
        })
    }

    /// Builder: receive session events.
    pub fn with_event_sink(mut self, sink: SessionEventSink) -> Self {
        self.events = Some(sink.clone());
        self.processor = TurnProcessor::new(self.handler.clone(), self.config.max_suggestions)
            .with_events(Some(sink));
        self
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.lock().transcript.clone()
    }

    pub fn turn_state(&self) -> TurnState {
        self.lock().turn_state
    }

    pub fn watch_turn_state(&self) -> watch::Receiver<TurnState> {
        self.state_tx.subscribe()
    }

    /// The outstanding action message, if the session is suspended.
    pub fn pending_action(&self) -> Option<Message> {
        let inner = self.lock();
        let id = inner.pending.as_ref()?;
        inner.transcript.iter().find(|m| &m.id == id).cloned()
    }

    /// Append a user message and run the turn it starts.
    pub async fn send_user_message(&self, text: &str) -> Result<TurnOutcome> {
        if text.trim().is_empty() {
            return Err(CompassError::InvalidArgument(
                "message text is empty".to_string(),
            ));
        }

        let chat = {
            let mut inner = self.lock();
            if inner.turn_state != TurnState::Idle {
                return Err(CompassError::TurnInProgress {
                    state: inner.turn_state,
                });
            }
            let from = self.transition(&mut inner, TurnState::AwaitingModel);
            let message = Message::user(text);
            inner.transcript.push(message.clone());
            let chat = inner.chat.clone();
            drop(inner);
            self.emit(SessionEvent::MessageAppended(message));
            self.emit_transition(from, TurnState::AwaitingModel);
            chat
        };

        self.drive(chat, TurnInput::Text(text.to_string())).await
    }

    /// Apply the user's decision to the outstanding action and resume the turn.
    ///
    /// Approve runs the pending calls in order; Deny answers each one with a
    /// synthetic error without touching the executor. Either way the held
    /// safe results and the new results go back to the model together.
    pub async fn resolve_pending_action(
        &self,
        message_id: &str,
        decision: ApprovalDecision,
    ) -> Result<TurnOutcome> {
        let (chat, calls, held) = {
            let mut inner = self.lock();
            let index = inner
                .transcript
                .iter()
                .position(|m| m.id == message_id && m.is_action())
                .ok_or_else(|| CompassError::NoPendingAction {
                    message_id: message_id.to_string(),
                })?;
            if !inner.transcript[index].is_pending_action() {
                return Err(CompassError::AlreadyResolved {
                    message_id: message_id.to_string(),
                });
            }
            if inner.pending.as_deref() != Some(message_id)
                || inner.turn_state != TurnState::AwaitingApproval
            {
                return Err(CompassError::NoPendingAction {
                    message_id: message_id.to_string(),
                });
            }

            let message = &mut inner.transcript[index];
            message.approval_state = Some(ApprovalState::from(decision));
            let calls = message.pending_calls.clone();
            let held = message.held_safe_results.clone();
            inner.pending = None;
            let from = self.transition(&mut inner, TurnState::AwaitingModel);
            let chat = inner.chat.clone();
            drop(inner);

            info!(%message_id, %decision, calls = calls.len(), "pending action resolved");
            self.emit(SessionEvent::ActionResolved {
                message_id: message_id.to_string(),
                decision,
            });
            self.emit_transition(from, TurnState::AwaitingModel);
            (chat, calls, held)
        };

        let mut results: Vec<ToolInvocationResult> = held;
        match decision {
            ApprovalDecision::Approve => {
                for call in &calls {
                    self.emit(SessionEvent::ToolExecutionStarted(call.clone()));
                    let result = self.handler.execute(call).await;
                    self.emit(SessionEvent::ToolExecutionFinished(result.clone()));
                    results.push(result);
                }
            }
            ApprovalDecision::Deny => {
                results.extend(
                    calls
                        .iter()
                        .map(|call| ToolInvocationResult::error(call, DENIED_TEXT)),
                );
            }
        }

        self.drive(chat, TurnInput::ToolResults(results)).await
    }

    /// Swap the model chat for a fresh one seeded with new instructions.
    pub fn reinitialize(&self, factory: &dyn ChatModelFactory, instructions: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.turn_state != TurnState::Idle {
            return Err(CompassError::TurnInProgress {
                state: inner.turn_state,
            });
        }
        inner.chat = factory.create_chat(instructions, declarations())?;
        let notice = Message::notice(INSTRUCTIONS_UPDATED_TEXT);
        inner.transcript.push(notice.clone());
        drop(inner);

        info!("conversation reinitialized with new instructions");
        self.emit(SessionEvent::MessageAppended(notice));
        Ok(())
    }

    /// Send `input` and keep replaying auto-run results until the turn
    /// settles, suspends or fails.
    async fn drive(&self, chat: Arc<dyn ChatModel>, input: TurnInput) -> Result<TurnOutcome> {
        let mut input = input;
        for _ in 0..self.config.max_auto_iterations {
            let response = match chat.send(input).await {
                Ok(response) => response,
                Err(err) => return Ok(self.fail(err)),
            };

            match self.processor.process(&response, Vec::new()).await {
                ProcessedTurn::Continue { appended } => {
                    self.finish(appended, TurnState::Idle, None);
                    return Ok(TurnOutcome::Settled);
                }
                ProcessedTurn::Suspend { appended } => {
                    let Some(message_id) = appended
                        .iter()
                        .rev()
                        .find(|m| m.is_pending_action())
                        .map(|m| m.id.clone())
                    else {
                        return Ok(self.fail(CompassError::ModelTurn(
                            "suspended turn without an action".to_string(),
                        )));
                    };
                    self.finish(appended, TurnState::AwaitingApproval, Some(message_id.clone()));
                    return Ok(TurnOutcome::AwaitingApproval { message_id });
                }
                ProcessedTurn::Replay { appended, results } => {
                    self.append(appended);
                    input = TurnInput::ToolResults(results);
                }
            }
        }

        Ok(self.fail(CompassError::ModelTurn(
            "tool loop exceeded max iterations".to_string(),
        )))
    }

    fn fail(&self, err: CompassError) -> TurnOutcome {
        warn!(error = %err, category = ?err.category(), "model turn failed");
        let message = Message::error(format!("{CONNECTION_ERROR_TEXT} {err}"));
        self.finish(vec![message], TurnState::Idle, None);
        TurnOutcome::Failed {
            error: err.to_string(),
        }
    }

    fn append(&self, messages: Vec<Message>) {
        if messages.is_empty() {
            return;
        }
        self.lock().transcript.extend(messages.iter().cloned());
        for message in messages {
            self.emit(SessionEvent::MessageAppended(message));
        }
    }

    fn finish(&self, messages: Vec<Message>, state: TurnState, pending: Option<String>) {
        let from = {
            let mut inner = self.lock();
            inner.transcript.extend(messages.iter().cloned());
            inner.pending = pending;
            self.transition(&mut inner, state)
        };
        for message in messages {
            self.emit(SessionEvent::MessageAppended(message));
        }
        self.emit_transition(from, state);
    }

    fn transition(&self, inner: &mut Inner, to: TurnState) -> TurnState {
        let from = inner.turn_state;
        inner.turn_state = to;
        self.state_tx.send_replace(to);
        from
    }

    fn emit_transition(&self, from: TurnState, to: TurnState) {
        if from != to {
            self.emit(SessionEvent::TurnStateChanged { from, to });
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(sink) = &self.events {
            sink(&event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
