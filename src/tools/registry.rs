//! Static catalog of the tools offered to the model.

use std::sync::OnceLock;

use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use super::schema::ToolParameters;
use crate::error::{CompassError, Result};

/// Whether a tool may run without asking the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ToolTrustClass {
    /// Read-only; dispatched automatically.
    Safe,
    /// Changes external state; needs explicit approval.
    Mutating,
}

/// Every tool the engine knows, by the name the model calls it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum ToolKind {
    GetAppState,
    LogDailyCheckIn,
    AddHabit,
    UpdateHabit,
    RemoveHabit,
    AddObjective,
    UpdateObjective,
    RemoveObjective,
    AddKeyResult,
    UpdateKeyResult,
    RemoveKeyResult,
    RememberFact,
    ForgetFact,
    GetJournalContext,
    AddCalendarEvent,
    ListCalendarEvents,
    UpdateCalendarEvent,
    DeleteCalendarEvent,
}

impl ToolKind {
    pub fn from_name(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| CompassError::UnknownTool(name.to_string()))
    }

    /// Only state inspection is trusted. The policy is static.
    pub fn trust(self) -> ToolTrustClass {
        match self {
            Self::GetAppState => ToolTrustClass::Safe,
            _ => ToolTrustClass::Mutating,
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::GetAppState => "Get the current state of the user app, including logs, habits, and objectives.",
            Self::LogDailyCheckIn => "Log or update the daily check-in. Partial updates are allowed (e.g., just logging mood).",
            Self::AddHabit => "Create a new habit to track.",
            Self::UpdateHabit => "Update an existing habit (rename, change category, or archive) by searching for its name.",
            Self::RemoveHabit => "Delete a habit by searching for its name.",
            Self::AddObjective => "Add a new annual objective.",
            Self::UpdateObjective => "Update an existing Objective details or status.",
            Self::RemoveObjective => "Delete an entire Objective and all its Key Results.",
            Self::AddKeyResult => "Add a key result to an existing objective.",
            Self::UpdateKeyResult => "Update a Key Result details, progress, or confidence.",
            Self::RemoveKeyResult => "Remove a key result from an objective.",
            Self::RememberFact => "Store a lasting memory about the user (e.g., job, age, core values, life events). Use this when the user shares something significant that should be recalled in future sessions. Do not use for trivial things.",
            Self::ForgetFact => "Remove a specific memory from long-term storage.",
            Self::GetJournalContext => "Get journal context: today's daily Stoic prompt, available guided journals with completion progress, and recent guided session history. Use this when the user asks about journals, prompts, or journaling progress.",
            Self::AddCalendarEvent => "Add an event to the user's Google Calendar. CALL THIS IMMEDIATELY if the user asks to schedule something. Do not ask for confirmation textually, the UI will handle it.",
            Self::ListCalendarEvents => "List upcoming calendar events to check availability or find events to update/delete.",
            Self::UpdateCalendarEvent => "Update an existing calendar event. You typically need to call 'listCalendarEvents' first to get the eventId.",
            Self::DeleteCalendarEvent => "Delete a calendar event. You typically need to call 'listCalendarEvents' first to get the eventId.",
        }
    }

    fn parameters(self) -> ToolParameters {
        let object = ToolParameters::object();
        match self {
            Self::GetAppState | Self::GetJournalContext => ToolParameters::empty(),
            Self::LogDailyCheckIn => object
                .number("mood", "Mood 1-5", false)
                .number("energy", "Energy 1-5", false)
                .number("deepWorkMinutes", "Minutes of deep work", false)
                .boolean("presenceRep", None, false)
                .boolean("buildRep", None, false)
                .boolean("workoutRep", None, false)
                .bare_string("win", false)
                .bare_string("lesson", false)
                .bare_string("priority", false)
                .build(),
            Self::AddHabit => object
                .string("name", "Habit name", true)
                .string("category", "Category: presence, builder, health, mind", true)
                .build(),
            Self::UpdateHabit => object
                .string("targetName", "The current name of the habit to update (fuzzy match)", true)
                .string("newName", "The new name (optional)", false)
                .string("newCategory", "The new category (optional)", false)
                .boolean("active", Some("Set to false to archive/deactivate (optional)"), false)
                .build(),
            Self::RemoveHabit => object
                .string("name", "The name of the habit to remove (fuzzy match)", true)
                .build(),
            Self::AddObjective => object
                .bare_string("title", true)
                .bare_string("theme", true)
                .bare_string("why", true)
                .build(),
            Self::UpdateObjective => object
                .string("targetTitle", "Current title (fuzzy match)", true)
                .bare_string("newTitle", false)
                .bare_string("newTheme", false)
                .bare_string("newWhy", false)
                .boolean("active", None, false)
                .build(),
            Self::RemoveObjective => object
                .string("title", "Title of the objective to remove (fuzzy match)", true)
                .build(),
            Self::AddKeyResult => object
                .string("objectiveTitle", "The exact title of the objective to match.", true)
                .string("title", "Key Result title", true)
                .string("target", "Target metric or qualitative state", true)
                .build(),
            Self::UpdateKeyResult => object
                .string("objectiveTitle", "The title of the objective containing the KR (fuzzy match)", true)
                .string("krTitle", "The current title of the KR (fuzzy match)", true)
                .bare_string("newTitle", false)
                .bare_string("newTarget", false)
                .string("newCurrent", "Current progress value (e.g., \"5/10 books\")", false)
                .number("newConfidence", "Confidence score 1-5", false)
                .build(),
            Self::RemoveKeyResult => object
                .string("objectiveTitle", "The title of the objective containing the KR (fuzzy match).", true)
                .string("keyResultTitle", "The title of the Key Result to remove (fuzzy match).", true)
                .build(),
            Self::RememberFact => object
                .string("fact", "The specific fact to remember.", true)
                .string("category", "identity, preference, history, or other", true)
                .build(),
            Self::ForgetFact => object
                .string("memoryId", "The ID of the memory to remove.", true)
                .build(),
            Self::AddCalendarEvent => object
                .string("title", "Event title", true)
                .string("startTime", "ISO 8601 start time (e.g., 2024-02-01T10:00:00)", true)
                .string("endTime", "ISO 8601 end time", true)
                .string("description", "Optional description", false)
                .build(),
            Self::ListCalendarEvents => object
                .string("timeMin", "ISO 8601 start time (default: now)", false)
                .string("timeMax", "ISO 8601 end time (default: 1 week from now)", false)
                .number("maxResults", "Max number of events to return", false)
                .build(),
            Self::UpdateCalendarEvent => object
                .string("eventId", "The ID of the event to update", true)
                .string("title", "New title", false)
                .string("startTime", "New start time (ISO 8601)", false)
                .string("endTime", "New end time (ISO 8601)", false)
                .string("description", "New description", false)
                .build(),
            Self::DeleteCalendarEvent => object
                .string("eventId", "The ID of the event to delete", true)
                .build(),
        }
    }
}

/// Name, description and parameter schema registered with the model.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    #[serde(serialize_with = "serialize_schema")]
    pub parameters: ToolParameters,
    #[serde(skip)]
    pub kind: ToolKind,
}

fn serialize_schema<S: serde::Serializer>(
    params: &ToolParameters,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    params.schema.serialize(serializer)
}

impl ToolDeclaration {
    pub fn trust(&self) -> ToolTrustClass {
        self.kind.trust()
    }
}

static DECLARATIONS: OnceLock<Vec<ToolDeclaration>> = OnceLock::new();

/// All declarations in catalog order, built on first use.
pub fn declarations() -> &'static [ToolDeclaration] {
    DECLARATIONS.get_or_init(|| {
        ToolKind::iter()
            .map(|kind| ToolDeclaration {
                name: kind.to_string(),
                description: kind.description().to_string(),
                parameters: kind.parameters(),
                kind,
            })
            .collect()
    })
}

/// Trust class of a tool by name.
pub fn trust_of(name: &str) -> Result<ToolTrustClass> {
    ToolKind::from_name(name).map(ToolKind::trust)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_names_are_unique_and_round_trip() {
        let names: HashSet<_> = declarations().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), declarations().len());
        assert_eq!(declarations().len(), 18);

        for decl in declarations() {
            assert_eq!(ToolKind::from_name(&decl.name).unwrap(), decl.kind);
        }
    }

    #[test]
    fn only_state_inspection_is_safe() {
        let safe: Vec<_> = declarations()
            .iter()
            .filter(|d| d.trust() == ToolTrustClass::Safe)
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(safe, vec!["getAppState"]);
        assert_eq!(trust_of("getJournalContext").unwrap(), ToolTrustClass::Mutating);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = trust_of("launchRockets").unwrap_err();
        assert!(matches!(err, CompassError::UnknownTool(name) if name == "launchRockets"));
    }

    #[test]
    fn serialized_declaration_is_a_function_declaration() {
        let decl = declarations()
            .iter()
            .find(|d| d.kind == ToolKind::AddKeyResult)
            .unwrap();
        let value = serde_json::to_value(decl).unwrap();

        assert_eq!(value["name"], "addKeyResult");
        assert_eq!(value["parameters"]["type"], "object");
        assert!(value.get("kind").is_none());
        assert_eq!(decl.parameters.required(), vec!["objectiveTitle", "title", "target"]);
    }
}
