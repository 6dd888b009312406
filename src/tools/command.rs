//! Typed tool commands parsed from model requests.

use crate::store::{LogType, MemoryCategory};
use crate::types::ToolInvocationRequest;

use super::arguments::ToolArguments;
use super::calendar::{EventPatch, NewEvent};
use super::error::ToolError;
use super::registry::ToolKind;

/// Partial daily check-in; `None` keeps the stored (or default) value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckIn {
    pub mood: Option<u8>,
    pub energy: Option<u8>,
    pub deep_work_minutes: Option<u32>,
    pub presence_rep: Option<bool>,
    pub build_rep: Option<bool>,
    pub workout_rep: Option<bool>,
    pub win: Option<String>,
    pub lesson: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HabitUpdate {
    pub target: String,
    pub name: Option<String>,
    pub category: Option<LogType>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveUpdate {
    pub target: String,
    pub title: Option<String>,
    pub theme: Option<LogType>,
    pub why: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyResultUpdate {
    pub objective: String,
    pub target: String,
    pub title: Option<String>,
    pub target_value: Option<String>,
    pub current: Option<String>,
    pub confidence: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    pub time_min: Option<String>,
    pub time_max: Option<String>,
    pub max_results: Option<u32>,
}

/// One tool invocation with its arguments decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCommand {
    GetAppState,
    LogDailyCheckIn(CheckIn),
    AddHabit { name: String, category: LogType },
    UpdateHabit(HabitUpdate),
    RemoveHabit { name: String },
    AddObjective { title: String, theme: LogType, why: String },
    UpdateObjective(ObjectiveUpdate),
    RemoveObjective { title: String },
    AddKeyResult { objective: String, title: String, target: String },
    UpdateKeyResult(KeyResultUpdate),
    RemoveKeyResult { objective: String, key_result: String },
    RememberFact { fact: String, category: MemoryCategory },
    ForgetFact { memory_id: String },
    GetJournalContext,
    AddCalendarEvent(NewEvent),
    ListCalendarEvents(EventQuery),
    UpdateCalendarEvent { event_id: String, patch: EventPatch },
    DeleteCalendarEvent { event_id: String },
}

impl ToolCommand {
    pub fn from_request(request: &ToolInvocationRequest) -> Result<Self, ToolError> {
        let kind = ToolKind::from_name(&request.name)
            .map_err(|_| ToolError::UnknownTool(request.name.clone()))?;
        Self::parse(kind, &ToolArguments::new(request.arguments.clone()))
    }

    /// Decode `args` for `kind`. Only the fields that identify what to act
    /// on are required; everything else falls back to defaults.
    pub fn parse(kind: ToolKind, args: &ToolArguments) -> Result<Self, ToolError> {
        let command = match kind {
            ToolKind::GetAppState => Self::GetAppState,
            ToolKind::LogDailyCheckIn => Self::LogDailyCheckIn(CheckIn {
                mood: args.clamped("mood", 1, 5).map(|n| n as u8),
                energy: args.clamped("energy", 1, 5).map(|n| n as u8),
                deep_work_minutes: args.count("deepWorkMinutes"),
                presence_rep: args.flag("presenceRep"),
                build_rep: args.flag("buildRep"),
                workout_rep: args.flag("workoutRep"),
                win: args.verbatim_text("win"),
                lesson: args.verbatim_text("lesson"),
                priority: args.verbatim_text("priority"),
            }),
            ToolKind::AddHabit => Self::AddHabit {
                name: args.require_text("name")?,
                category: args.text("category").map(LogType::parse_lenient).unwrap_or_default(),
            },
            ToolKind::UpdateHabit => Self::UpdateHabit(HabitUpdate {
                target: args.require_text("targetName")?,
                name: args.text_owned("newName"),
                category: args.text("newCategory").map(LogType::parse_lenient),
                active: args.flag("active"),
            }),
            ToolKind::RemoveHabit => Self::RemoveHabit {
                name: args.require_text("name")?,
            },
            ToolKind::AddObjective => Self::AddObjective {
                title: args.require_text("title")?,
                theme: args.text("theme").map(LogType::parse_lenient).unwrap_or_default(),
                why: args.text_owned("why").unwrap_or_default(),
            },
            ToolKind::UpdateObjective => Self::UpdateObjective(ObjectiveUpdate {
                target: args.require_text("targetTitle")?,
                title: args.text_owned("newTitle"),
                theme: args.text("newTheme").map(LogType::parse_lenient),
                why: args.text_owned("newWhy"),
                active: args.flag("active"),
            }),
            ToolKind::RemoveObjective => Self::RemoveObjective {
                title: args.require_text("title")?,
            },
            ToolKind::AddKeyResult => Self::AddKeyResult {
                objective: args.require_text("objectiveTitle")?,
                title: args.require_text("title")?,
                target: args.text_owned("target").unwrap_or_default(),
            },
            ToolKind::UpdateKeyResult => Self::UpdateKeyResult(KeyResultUpdate {
                objective: args.require_text("objectiveTitle")?,
                target: args.require_text("krTitle")?,
                title: args.text_owned("newTitle"),
                target_value: args.text_owned("newTarget"),
                current: args.text_owned("newCurrent"),
                confidence: args.clamped("newConfidence", 1, 5).map(|n| n as u8),
            }),
            ToolKind::RemoveKeyResult => Self::RemoveKeyResult {
                objective: args.require_text("objectiveTitle")?,
                key_result: args.require_text("keyResultTitle")?,
            },
            ToolKind::RememberFact => Self::RememberFact {
                fact: args.require_text("fact")?,
                category: args
                    .text("category")
                    .map(MemoryCategory::parse_lenient)
                    .unwrap_or_default(),
            },
            ToolKind::ForgetFact => Self::ForgetFact {
                memory_id: args.require_text("memoryId")?,
            },
            ToolKind::GetJournalContext => Self::GetJournalContext,
            ToolKind::AddCalendarEvent => Self::AddCalendarEvent(NewEvent {
                title: args.require_text("title")?,
                start_time: args.require_text("startTime")?,
                end_time: args.require_text("endTime")?,
                description: args.text_owned("description"),
            }),
            ToolKind::ListCalendarEvents => Self::ListCalendarEvents(EventQuery {
                time_min: args.text_owned("timeMin"),
                time_max: args.text_owned("timeMax"),
                max_results: args.clamped("maxResults", 1, 250),
            }),
            ToolKind::UpdateCalendarEvent => Self::UpdateCalendarEvent {
                event_id: args.require_text("eventId")?,
                patch: EventPatch {
                    title: args.text_owned("title"),
                    start_time: args.text_owned("startTime"),
                    end_time: args.text_owned("endTime"),
                    description: args.text_owned("description"),
                },
            },
            ToolKind::DeleteCalendarEvent => Self::DeleteCalendarEvent {
                event_id: args.require_text("eventId")?,
            },
        };
        Ok(command)
    }

    /// One-line preview shown on an approval card.
    pub fn describe(&self) -> String {
        match self {
            Self::GetAppState => "Read app state".to_string(),
            Self::LogDailyCheckIn(c) => {
                let mut parts = Vec::new();
                if let Some(mood) = c.mood {
                    parts.push(format!("mood {mood}"));
                }
                if let Some(energy) = c.energy {
                    parts.push(format!("energy {energy}"));
                }
                if let Some(minutes) = c.deep_work_minutes {
                    parts.push(format!("{minutes} min deep work"));
                }
                if parts.is_empty() {
                    "Update today's check-in".to_string()
                } else {
                    format!("Update today's check-in: {}", parts.join(", "))
                }
            }
            Self::AddHabit { name, category } => format!("Add habit \"{name}\" ({category})"),
            Self::UpdateHabit(u) => format!("Update habit matching \"{}\"", u.target),
            Self::RemoveHabit { name } => format!("Remove habit matching \"{name}\""),
            Self::AddObjective { title, theme, .. } => {
                format!("Add objective \"{title}\" ({theme})")
            }
            Self::UpdateObjective(u) => format!("Update objective matching \"{}\"", u.target),
            Self::RemoveObjective { title } => {
                format!("Remove objective matching \"{title}\" and its key results")
            }
            Self::AddKeyResult {
                objective, title, ..
            } => format!("Add key result \"{title}\" to \"{objective}\""),
            Self::UpdateKeyResult(u) => {
                format!("Update key result \"{}\" in \"{}\"", u.target, u.objective)
            }
            Self::RemoveKeyResult {
                objective,
                key_result,
            } => format!("Remove key result \"{key_result}\" from \"{objective}\""),
            Self::RememberFact { fact, category } => format!("Remember ({category}): {fact}"),
            Self::ForgetFact { memory_id } => format!("Forget memory {memory_id}"),
            Self::GetJournalContext => "Read journal progress".to_string(),
            Self::AddCalendarEvent(e) => {
                format!("Add calendar event \"{}\" at {}", e.title, e.start_time)
            }
            Self::ListCalendarEvents(_) => "List upcoming calendar events".to_string(),
            Self::UpdateCalendarEvent { event_id, .. } => {
                format!("Update calendar event {event_id}")
            }
            Self::DeleteCalendarEvent { event_id } => format!("Delete calendar event {event_id}"),
        }
    }
}

/// Preview for a raw request, falling back to the tool name when the
/// arguments cannot be decoded.
pub fn describe_request(request: &ToolInvocationRequest) -> String {
    ToolCommand::from_request(request)
        .map(|c| c.describe())
        .unwrap_or_else(|_| request.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(name: &str, args: serde_json::Value) -> ToolInvocationRequest {
        ToolInvocationRequest::new("1", name, args)
    }

    #[test]
    fn parses_partial_check_in() {
        let command = ToolCommand::from_request(&request("logDailyCheckIn", json!({ "mood": 4 }))).unwrap();

        assert_eq!(
            command,
            ToolCommand::LogDailyCheckIn(CheckIn {
                mood: Some(4),
                ..Default::default()
            })
        );
    }

    #[test]
    fn empty_reflection_fields_clear_the_stored_text() {
        let command = ToolCommand::from_request(&request(
            "logDailyCheckIn",
            json!({ "win": "", "priority": "rest" }),
        ))
        .unwrap();

        let ToolCommand::LogDailyCheckIn(check_in) = command else {
            panic!("expected check-in");
        };
        assert_eq!(check_in.win.as_deref(), Some(""));
        assert_eq!(check_in.lesson, None);
        assert_eq!(check_in.priority.as_deref(), Some("rest"));
    }

    #[test]
    fn blank_update_fields_are_not_supplied() {
        let command = ToolCommand::from_request(&request(
            "updateObjective",
            json!({ "targetTitle": "Health", "newTitle": "", "newTheme": "health", "active": false }),
        ))
        .unwrap();

        let ToolCommand::UpdateObjective(update) = command else {
            panic!("expected objective update");
        };
        assert_eq!(update.title, None);
        assert_eq!(update.theme, Some(LogType::Health));
        assert_eq!(update.active, Some(false));
    }

    #[test]
    fn missing_target_is_invalid() {
        let err = ToolCommand::from_request(&request("removeHabit", json!({}))).unwrap_err();
        assert_eq!(err, ToolError::InvalidArguments("missing required field 'name'".into()));
    }

    #[test]
    fn unknown_tool_is_reported() {
        let err = ToolCommand::from_request(&request("openPodBayDoors", json!({}))).unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool");
    }

    #[test]
    fn memory_category_defaults_to_other() {
        let command =
            ToolCommand::from_request(&request("rememberFact", json!({ "fact": "Has a dog" }))).unwrap();
        assert_eq!(
            command,
            ToolCommand::RememberFact {
                fact: "Has a dog".into(),
                category: MemoryCategory::Other,
            }
        );
    }

    #[test]
    fn describes_requests_for_approval_cards() {
        let add = request("addHabit", json!({ "name": "Read", "category": "mind" }));
        assert_eq!(describe_request(&add), "Add habit \"Read\" (mind)");

        let broken = request("addHabit", json!({}));
        assert_eq!(describe_request(&broken), "addHabit");
    }
}
