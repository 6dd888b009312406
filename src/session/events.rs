//! Notifications emitted while a session runs.

use std::sync::Arc;

use crate::types::{ApprovalDecision, Message, ToolInvocationRequest, ToolInvocationResult};

use super::TurnState;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    MessageAppended(Message),
    TurnStateChanged { from: TurnState, to: TurnState },
    ToolExecutionStarted(ToolInvocationRequest),
    ToolExecutionFinished(ToolInvocationResult),
    ActionResolved {
        message_id: String,
        decision: ApprovalDecision,
    },
}

/// Callback receiving [`SessionEvent`]s. Called outside the session lock.
pub type SessionEventSink = Arc<dyn Fn(&SessionEvent) + Send + Sync>;
