//! Executes one tool invocation against the state store and calendar.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Local, SecondsFormat, Utc};
use serde_json::json;
use tracing::{debug, warn};

use crate::store::{AppState, Reduction, StateMutationSink};
use crate::types::{ToolInvocationRequest, ToolInvocationResult};

use super::calendar::{CalendarService, DisconnectedCalendar, EventWindow};
use super::command::{EventQuery, ToolCommand};
use super::error::ToolError;
use super::journal::JournalCatalog;
use super::reducers::{self, Stamp};

const DEFAULT_EVENT_LIMIT: u32 = 10;
const DEFAULT_EVENT_WINDOW_DAYS: i64 = 7;

/// Anything that can turn a tool request into a result.
///
/// Implementations never fail: every problem is reported as an error result.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn execute(&self, request: &ToolInvocationRequest) -> ToolInvocationResult;
}

/// Default handler backed by a state store, a calendar and the journal catalog.
pub struct ToolExecutor {
    store: Arc<dyn StateMutationSink>,
    calendar: Arc<dyn CalendarService>,
    journal: Arc<JournalCatalog>,
}

impl std::fmt::Debug for ToolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExecutor")
            .field("journals", &self.journal.guided_journals.len())
            .finish_non_exhaustive()
    }
}

impl ToolExecutor {
    /// Executor with no calendar connected and an empty journal catalog.
    pub fn new(store: Arc<dyn StateMutationSink>) -> Self {
        Self {
            store,
            calendar: Arc::new(DisconnectedCalendar),
            journal: Arc::new(JournalCatalog::default()),
        }
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarService>) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn with_journal(mut self, journal: Arc<JournalCatalog>) -> Self {
        self.journal = journal;
        self
    }

    fn commit<F>(&self, reducer: F) -> Result<serde_json::Value, ToolError>
    where
        F: Fn(&AppState) -> Result<Reduction, ToolError> + Send + Sync,
    {
        let message = self.store.commit(&reducer)?;
        Ok(success(message))
    }

    /// Run `request`, surfacing failures as [`ToolError`].
    pub async fn run(&self, request: &ToolInvocationRequest) -> Result<serde_json::Value, ToolError> {
        let command = ToolCommand::from_request(request)?;
        let stamp = Stamp::now();

        match &command {
            ToolCommand::GetAppState => serde_json::to_value(self.store.snapshot())
                .map_err(|e| ToolError::Execution(e.to_string())),
            ToolCommand::GetJournalContext => Ok(self
                .journal
                .context(&self.store.snapshot(), Local::now().date_naive())),
            ToolCommand::LogDailyCheckIn(check_in) => {
                self.commit(|s| Ok(reducers::log_check_in(s, check_in, stamp.today)))
            }
            ToolCommand::AddHabit { name, category } => {
                self.commit(|s| Ok(reducers::add_habit(s, name, *category, &stamp)))
            }
            ToolCommand::UpdateHabit(update) => self.commit(|s| reducers::update_habit(s, update)),
            ToolCommand::RemoveHabit { name } => self.commit(|s| reducers::remove_habit(s, name)),
            ToolCommand::AddObjective { title, theme, why } => {
                self.commit(|s| Ok(reducers::add_objective(s, title, *theme, why, &stamp)))
            }
            ToolCommand::UpdateObjective(update) => {
                self.commit(|s| reducers::update_objective(s, update))
            }
            ToolCommand::RemoveObjective { title } => {
                self.commit(|s| reducers::remove_objective(s, title))
            }
            ToolCommand::AddKeyResult {
                objective,
                title,
                target,
            } => self.commit(|s| reducers::add_key_result(s, objective, title, target, &stamp)),
            ToolCommand::UpdateKeyResult(update) => {
                self.commit(|s| reducers::update_key_result(s, update))
            }
            ToolCommand::RemoveKeyResult {
                objective,
                key_result,
            } => self.commit(|s| reducers::remove_key_result(s, objective, key_result)),
            ToolCommand::RememberFact { fact, category } => {
                self.commit(|s| Ok(reducers::remember_fact(s, fact, *category, &stamp)))
            }
            ToolCommand::ForgetFact { memory_id } => {
                self.commit(|s| Ok(reducers::forget_fact(s, memory_id)))
            }
            ToolCommand::AddCalendarEvent(event) => {
                let link = self.calendar.create_event(event).await?;
                Ok(success(match link {
                    Some(link) => format!("Event created: {link}"),
                    None => "Event created.".to_string(),
                }))
            }
            ToolCommand::ListCalendarEvents(query) => {
                let events = self.calendar.list_events(&event_window(query)).await?;
                Ok(json!({
                    "status": "success",
                    "message": format!("Found {} event(s).", events.len()),
                    "events": events,
                }))
            }
            ToolCommand::UpdateCalendarEvent { event_id, patch } => {
                if patch.is_empty() {
                    return Err(ToolError::InvalidArguments(
                        "no event fields to update".to_string(),
                    ));
                }
                let link = self.calendar.update_event(event_id, patch).await?;
                Ok(success(match link {
                    Some(link) => format!("Event updated: {link}"),
                    None => "Event updated.".to_string(),
                }))
            }
            ToolCommand::DeleteCalendarEvent { event_id } => {
                self.calendar.delete_event(event_id).await?;
                Ok(success("Event deleted."))
            }
        }
    }
}

#[async_trait]
impl ToolHandler for ToolExecutor {
    async fn execute(&self, request: &ToolInvocationRequest) -> ToolInvocationResult {
        debug!(tool = %request.name, call_id = %request.id, "executing tool");
        match self.run(request).await {
            Ok(value) => ToolInvocationResult::success(request, value),
            Err(err) => {
                warn!(tool = %request.name, call_id = %request.id, error = %err, "tool failed");
                ToolInvocationResult::error(request, err.to_string())
            }
        }
    }
}

fn success(message: impl Into<String>) -> serde_json::Value {
    json!({ "status": "success", "message": message.into() })
}

/// Fill in the default window: now until a week from now, ten events.
fn event_window(query: &EventQuery) -> EventWindow {
    let now = Utc::now();
    let format = |t: chrono::DateTime<Utc>| t.to_rfc3339_opts(SecondsFormat::Millis, true);
    EventWindow {
        time_min: query.time_min.clone().unwrap_or_else(|| format(now)),
        time_max: query
            .time_max
            .clone()
            .unwrap_or_else(|| format(now + Duration::days(DEFAULT_EVENT_WINDOW_DAYS))),
        max_results: query.max_results.unwrap_or(DEFAULT_EVENT_LIMIT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStateStore;
    use crate::tools::error::CALENDAR_PERMISSION_TEXT;
    use crate::types::ToolOutcome;

    fn executor() -> (Arc<InMemoryStateStore>, ToolExecutor) {
        let store = Arc::new(InMemoryStateStore::default());
        (store.clone(), ToolExecutor::new(store))
    }

    fn call(name: &str, args: serde_json::Value) -> ToolInvocationRequest {
        ToolInvocationRequest::new(format!("{name}-1"), name, args)
    }

    #[tokio::test]
    async fn creates_habit_and_reports_success() {
        let (store, executor) = executor();

        let result = executor
            .execute(&call("addHabit", json!({ "name": "Read", "category": "mind" })))
            .await;

        assert_eq!(
            result.outcome,
            ToolOutcome::Success {
                value: json!({ "status": "success", "message": "Habit 'Read' created." })
            }
        );
        assert_eq!(store.snapshot().habits.len(), 1);
    }

    #[tokio::test]
    async fn not_found_becomes_error_result_without_mutation() {
        let (store, executor) = executor();

        let result = executor
            .execute(&call("removeObjective", json!({ "title": "Mars" })))
            .await;

        assert!(result.is_error());
        assert_eq!(result.id, "removeObjective-1");
        assert_eq!(store.snapshot(), AppState::default());
    }

    #[tokio::test]
    async fn get_app_state_never_mutates() {
        let (store, executor) = executor();
        executor
            .execute(&call("rememberFact", json!({ "fact": "Lives in Lisbon", "category": "identity" })))
            .await;
        let before = store.snapshot();

        let result = executor.execute(&call("getAppState", json!({}))).await;

        let ToolOutcome::Success { value } = result.outcome else {
            panic!("expected success");
        };
        assert_eq!(value["memories"][0]["content"], "Lives in Lisbon");
        assert_eq!(value["memories"][0]["category"], "identity");
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn calendar_without_token_asks_for_sign_in() {
        let (_, executor) = executor();

        let result = executor.execute(&call("deleteCalendarEvent", json!({ "eventId": "e1" }))).await;

        assert_eq!(
            result.outcome,
            ToolOutcome::Error {
                message: CALENDAR_PERMISSION_TEXT.to_string()
            }
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result() {
        let (_, executor) = executor();
        let result = executor.execute(&call("selfDestruct", json!({}))).await;
        assert_eq!(
            result.outcome,
            ToolOutcome::Error {
                message: "Unknown tool".into()
            }
        );
    }

    #[test]
    fn event_window_defaults_to_a_week_of_ten() {
        let window = event_window(&EventQuery::default());
        assert_eq!(window.max_results, 10);
        assert!(window.time_min < window.time_max);

        let explicit = event_window(&EventQuery {
            time_min: Some("2025-01-01T00:00:00Z".into()),
            time_max: None,
            max_results: Some(3),
        });
        assert_eq!(explicit.time_min, "2025-01-01T00:00:00Z");
        assert_eq!(explicit.max_results, 3);
    }
}
