//! Interprets one model response.
//!
//! [`plan`] is the pure decision: what to show, which calls are safe, which
//! need approval. [`TurnProcessor::process`] then runs the safe calls and
//! says how the turn continues.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};

use crate::model::ModelResponse;
use crate::tools::{ToolHandler, ToolKind, ToolTrustClass};
use crate::types::{Message, ToolInvocationRequest, ToolInvocationResult};

use super::events::{SessionEvent, SessionEventSink};
use super::suggestions::extract_suggestions;

/// Shown when the model proposes a memory without saying anything.
pub const MEMORY_DRAFT_TEXT: &str = "I've drafted a memory card for that detail.";

/// Decision for one model response, before anything runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnPlan {
    /// Model message to append, if the response has something to show.
    pub display: Option<Message>,
    pub safe_calls: Vec<ToolInvocationRequest>,
    pub mutating_calls: Vec<ToolInvocationRequest>,
    /// Calls naming tools outside the catalog.
    pub unknown_calls: Vec<ToolInvocationRequest>,
}

impl TurnPlan {
    pub fn has_calls(&self) -> bool {
        !(self.safe_calls.is_empty() && self.mutating_calls.is_empty() && self.unknown_calls.is_empty())
    }
}

pub fn plan(response: &ModelResponse, max_suggestions: usize) -> TurnPlan {
    let extracted = extract_suggestions(response.text.as_deref().unwrap_or_default(), max_suggestions);
    let suggestions = if response.has_tool_calls() {
        Vec::new()
    } else {
        extracted.suggestions
    };

    let display = if !extracted.text.is_empty() {
        Some(Message::model(extracted.text, suggestions))
    } else if response
        .tool_calls
        .iter()
        .any(|c| c.name == ToolKind::RememberFact.as_ref())
    {
        Some(Message::model(MEMORY_DRAFT_TEXT, Vec::new()))
    } else {
        None
    };

    let mut plan = TurnPlan {
        display,
        ..TurnPlan::default()
    };
    for call in &response.tool_calls {
        match ToolKind::from_name(&call.name).map(ToolKind::trust) {
            Ok(ToolTrustClass::Safe) => plan.safe_calls.push(call.clone()),
            Ok(ToolTrustClass::Mutating) => plan.mutating_calls.push(call.clone()),
            Err(_) => plan.unknown_calls.push(call.clone()),
        }
    }
    plan
}

/// How the turn proceeds after one response.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessedTurn {
    /// No calls; the turn is settled.
    Continue { appended: Vec<Message> },
    /// Only auto-run calls; send `results` back to the model.
    Replay {
        appended: Vec<Message>,
        results: Vec<ToolInvocationResult>,
    },
    /// Mutating calls await approval; the last appended message is the action.
    Suspend { appended: Vec<Message> },
}

impl ProcessedTurn {
    pub fn appended(&self) -> &[Message] {
        match self {
            Self::Continue { appended } | Self::Replay { appended, .. } | Self::Suspend { appended } => {
                appended
            }
        }
    }
}

pub struct TurnProcessor {
    handler: Arc<dyn ToolHandler>,
    max_suggestions: usize,
    events: Option<SessionEventSink>,
}

impl TurnProcessor {
    pub fn new(handler: Arc<dyn ToolHandler>, max_suggestions: usize) -> Self {
        Self {
            handler,
            max_suggestions,
            events: None,
        }
    }

    pub fn with_events(mut self, events: Option<SessionEventSink>) -> Self {
        self.events = events;
        self
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(sink) = &self.events {
            sink(&event);
        }
    }

    /// Run the safe calls of `response` concurrently and decide what comes next.
    ///
    /// `held` results are carried ahead of this response's safe results into
    /// either the suspended action or the replay.
    pub async fn process(
        &self,
        response: &ModelResponse,
        held: Vec<ToolInvocationResult>,
    ) -> ProcessedTurn {
        let plan = plan(response, self.max_suggestions);
        let mut appended: Vec<Message> = plan.display.iter().cloned().collect();

        if !plan.has_calls() {
            return ProcessedTurn::Continue { appended };
        }

        debug!(
            safe = plan.safe_calls.len(),
            mutating = plan.mutating_calls.len(),
            unknown = plan.unknown_calls.len(),
            "dispatching tool calls"
        );
        for call in &plan.safe_calls {
            self.emit(SessionEvent::ToolExecutionStarted(call.clone()));
        }
        let safe_results = join_all(plan.safe_calls.iter().map(|c| self.handler.execute(c))).await;
        for result in &safe_results {
            self.emit(SessionEvent::ToolExecutionFinished(result.clone()));
        }

        let mut results = held;
        results.extend(safe_results);
        results.extend(
            plan.unknown_calls
                .iter()
                .map(|c| ToolInvocationResult::error(c, "Unknown tool")),
        );

        if plan.mutating_calls.is_empty() {
            return ProcessedTurn::Replay { appended, results };
        }

        info!(
            pending = plan.mutating_calls.len(),
            held = results.len(),
            "turn suspended awaiting approval"
        );
        appended.push(Message::action(plan.mutating_calls, results));
        ProcessedTurn::Suspend { appended }
    }
}
