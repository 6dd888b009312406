//! Convenience re-exports for common use.

pub use crate::config::{CompassConfig, SessionConfig};
pub use crate::error::{CompassError, Result};
pub use crate::model::{ChatModel, ChatModelFactory, GeminiChatFactory, ModelResponse, TurnInput};
pub use crate::session::{ConversationSession, SessionEvent, TurnOutcome, TurnState};
pub use crate::store::{AppState, InMemoryStateStore, StateMutationSink};
pub use crate::tools::{
    CalendarService, GoogleCalendarClient, JournalCatalog, ToolExecutor, ToolHandler, ToolKind,
};
pub use crate::types::{
    ApprovalDecision, Message, MessageKind, Role, ToolInvocationRequest, ToolInvocationResult,
};
