//! Conversation sessions and the per-response turn logic.

pub mod conversation;
pub mod events;
pub mod processor;
pub mod suggestions;

pub use conversation::{
    ConversationSession, TurnOutcome, TurnState, CONNECTION_ERROR_TEXT, DENIED_TEXT,
};
pub use events::{SessionEvent, SessionEventSink};
pub use processor::{plan, ProcessedTurn, TurnPlan, TurnProcessor, MEMORY_DRAFT_TEXT};
pub use suggestions::{extract_suggestions, Extracted};
