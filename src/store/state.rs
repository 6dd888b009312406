//! Application state document read and mutated by the tool executor.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Life area a habit or objective belongs to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase", from = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogType {
    Presence,
    Builder,
    Health,
    #[default]
    Mind,
    Wealth,
}

impl LogType {
    /// Parse a model-supplied category, falling back to the default area.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.trim().parse().unwrap_or_default()
    }
}

impl From<String> for LogType {
    fn from(raw: String) -> Self {
        Self::parse_lenient(&raw)
    }
}

/// Kind of long-term fact remembered about the user.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase", from = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MemoryCategory {
    Identity,
    Preference,
    History,
    #[default]
    Other,
}

impl MemoryCategory {
    pub fn parse_lenient(raw: &str) -> Self {
        raw.trim().parse().unwrap_or_default()
    }
}

impl From<String> for MemoryCategory {
    fn from(raw: String) -> Self {
        Self::parse_lenient(&raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reps {
    pub presence: bool,
    pub build: bool,
    pub workout: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reflection {
    pub win: String,
    pub lesson: String,
    pub priority: String,
}

/// One check-in per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub date: NaiveDate,
    pub mood: u8,
    pub energy: u8,
    #[serde(default)]
    pub deep_work_minutes: u32,
    #[serde(default)]
    pub reps: Reps,
    #[serde(default)]
    pub reflection: Reflection,
    #[serde(default)]
    pub habits_completed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: LogType,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResult {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub current: String,
    #[serde(default = "default_confidence")]
    pub confidence: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub id: String,
    pub year: i32,
    #[serde(default)]
    pub theme: LogType,
    pub title: String,
    #[serde(default)]
    pub why: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub key_results: Vec<KeyResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub category: MemoryCategory,
    pub added_at: DateTime<Utc>,
}

/// A completed guided-journal session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuidedSession {
    pub id: String,
    pub journal_id: String,
    pub date: String,
    pub responses: Vec<serde_json::Value>,
}

/// The flat user document.
///
/// Fields the engine does not interpret (theme, weekly reviews, unlocked
/// visualizations, ...) are kept in `extra` so a load/save cycle is lossless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub user: Option<User>,
    pub logs: Vec<DailyLog>,
    pub habits: Vec<Habit>,
    pub objectives: Vec<Objective>,
    pub memories: Vec<Memory>,
    pub journal_progress: BTreeMap<String, u32>,
    pub guided_sessions: Vec<GuidedSession>,
    pub system_prompt: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AppState {
    pub fn active_habit_count(&self) -> usize {
        self.habits.iter().filter(|h| h.active).count()
    }

    pub fn active_objective_count(&self) -> usize {
        self.objectives.iter().filter(|o| o.active).count()
    }

    /// Most recently appended check-in.
    pub fn last_log(&self) -> Option<&DailyLog> {
        self.logs.last()
    }

    pub fn log_for(&self, date: NaiveDate) -> Option<&DailyLog> {
        self.logs.iter().find(|l| l.date == date)
    }
}

fn default_true() -> bool {
    true
}

fn default_confidence() -> u8 {
    3
}
