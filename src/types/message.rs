//! Transcript message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::tool::{ToolInvocationRequest, ToolInvocationResult};

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Model,
    System,
}

/// What a transcript entry represents, so UIs can render it appropriately.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageKind {
    /// Ordinary user or model text.
    Chat,
    /// A suspended turn awaiting an approve/deny decision.
    Action,
    /// Informational system text.
    Notice,
    /// A turn that failed at the transport level.
    Error,
}

/// Approval lifecycle of an action message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApprovalState {
    Pending,
    Approved,
    Denied,
}

/// User decision applied to a pending action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    Deny,
}

impl From<ApprovalDecision> for ApprovalState {
    fn from(decision: ApprovalDecision) -> Self {
        match decision {
            ApprovalDecision::Approve => Self::Approved,
            ApprovalDecision::Deny => Self::Denied,
        }
    }
}

/// A single transcript entry.
///
/// `pending_calls`, `held_safe_results` and `approval_state` are only
/// populated on [`MessageKind::Action`] messages. Once `approval_state`
/// leaves `Pending` the message is history and is never modified again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_calls: Vec<ToolInvocationRequest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub held_safe_results: Vec<ToolInvocationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_state: Option<ApprovalState>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn base(role: Role, kind: MessageKind, text: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            kind,
            text,
            suggestions: Vec::new(),
            pending_calls: Vec::new(),
            held_safe_results: Vec::new(),
            approval_state: None,
            created_at: Utc::now(),
        }
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::base(Role::User, MessageKind::Chat, Some(text.into()))
    }

    /// Create a model message with follow-up suggestions.
    pub fn model(text: impl Into<String>, suggestions: Vec<String>) -> Self {
        let mut message = Self::base(Role::Model, MessageKind::Chat, Some(text.into()));
        message.suggestions = suggestions;
        message
    }

    /// Create a suspended action message awaiting approval.
    pub fn action(
        pending_calls: Vec<ToolInvocationRequest>,
        held_safe_results: Vec<ToolInvocationResult>,
    ) -> Self {
        let mut message = Self::base(Role::System, MessageKind::Action, None);
        message.pending_calls = pending_calls;
        message.held_safe_results = held_safe_results;
        message.approval_state = Some(ApprovalState::Pending);
        message
    }

    /// Create an informational system message.
    pub fn notice(text: impl Into<String>) -> Self {
        Self::base(Role::System, MessageKind::Notice, Some(text.into()))
    }

    /// Create a visible turn-failure message.
    pub fn error(text: impl Into<String>) -> Self {
        Self::base(Role::System, MessageKind::Error, Some(text.into()))
    }

    /// Whether this message is an action still waiting for a decision.
    pub fn is_pending_action(&self) -> bool {
        self.approval_state == Some(ApprovalState::Pending)
    }

    /// Whether this message is an action message (pending or resolved).
    pub fn is_action(&self) -> bool {
        self.kind == MessageKind::Action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_message_starts_pending() {
        let call = ToolInvocationRequest::new("c1", "addHabit", json!({ "name": "Read" }));
        let message = Message::action(vec![call], Vec::new());

        assert_eq!(message.role, Role::System);
        assert!(message.is_action());
        assert!(message.is_pending_action());
        assert_eq!(message.pending_calls.len(), 1);
    }

    #[test]
    fn chat_messages_carry_no_action_fields() {
        let message = Message::model("hi", vec!["Tell me more".into()]);

        assert!(!message.is_action());
        assert!(message.approval_state.is_none());
        assert!(message.pending_calls.is_empty());
    }

    #[test]
    fn decision_maps_to_terminal_state() {
        assert_eq!(
            ApprovalState::from(ApprovalDecision::Approve),
            ApprovalState::Approved
        );
        assert_eq!(ApprovalState::from(ApprovalDecision::Deny), ApprovalState::Denied);
    }

    #[test]
    fn message_ids_are_unique() {
        assert_ne!(Message::user("a").id, Message::user("a").id);
    }
}
