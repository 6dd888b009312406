//! Journal catalog content and the journal summary handed to the model.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::store::AppState;

pub const DEFAULT_WEEK_THEME: &str = "Reflection";
const RECENT_SESSION_LIMIT: usize = 5;

/// One dated entry of the daily Stoic journal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoicEntry {
    /// Display date, e.g. "January 3, 2025".
    pub date: String,
    pub prompt: String,
    pub quote: String,
    pub author: String,
    pub week: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidedJournal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub prompts: Vec<serde_json::Value>,
}

/// Static journal content. Empty by default; loaded from JSON when available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JournalCatalog {
    pub daily_entries: Vec<StoicEntry>,
    pub guided_journals: Vec<GuidedJournal>,
    /// Week number (as a string key) to theme.
    pub week_themes: BTreeMap<String, String>,
}

impl JournalCatalog {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn entry_for(&self, date: NaiveDate) -> Option<&StoicEntry> {
        let key = date.format("%B %-d, %Y").to_string();
        self.daily_entries.iter().find(|e| e.date == key)
    }

    pub fn journal(&self, id: &str) -> Option<&GuidedJournal> {
        self.guided_journals.iter().find(|j| j.id == id)
    }

    pub fn theme_for_week(&self, week: u32) -> &str {
        self.week_themes
            .get(&week.to_string())
            .map(String::as_str)
            .unwrap_or(DEFAULT_WEEK_THEME)
    }

    /// "Title: N session(s)" for every tracked journal known to the catalog.
    pub fn progress_summary(&self, state: &AppState) -> String {
        let parts: Vec<String> = state
            .journal_progress
            .iter()
            .filter_map(|(id, count)| {
                self.journal(id)
                    .map(|j| format!("{}: {count} session(s)", j.title))
            })
            .collect();
        if parts.is_empty() {
            "None yet".to_string()
        } else {
            parts.join(", ")
        }
    }

    /// Payload returned by the `getJournalContext` tool.
    pub fn context(&self, state: &AppState, today: NaiveDate) -> serde_json::Value {
        let daily_stoic = match self.entry_for(today) {
            Some(entry) => json!({
                "date": entry.date,
                "prompt": entry.prompt,
                "quote": entry.quote,
                "author": entry.author,
                "week": entry.week,
            }),
            None => json!({ "message": "No entry found for today" }),
        };

        let available: Vec<_> = self
            .guided_journals
            .iter()
            .map(|j| {
                let completed = state.journal_progress.get(&j.id).copied().unwrap_or(0);
                let prompt_count = j.prompts.len();
                json!({
                    "id": j.id,
                    "title": j.title,
                    "description": j.description,
                    "promptCount": prompt_count,
                    "sessionsCompleted": completed,
                    "timesFullyCompleted": completed as usize / prompt_count.max(1),
                })
            })
            .collect();

        let skip = state
            .guided_sessions
            .len()
            .saturating_sub(RECENT_SESSION_LIMIT);
        let recent: Vec<_> = state
            .guided_sessions
            .iter()
            .skip(skip)
            .map(|s| {
                let title = self
                    .journal(&s.journal_id)
                    .map(|j| j.title.as_str())
                    .unwrap_or(&s.journal_id);
                json!({
                    "date": s.date,
                    "journalTitle": title,
                    "responseCount": s.responses.len(),
                })
            })
            .collect();

        json!({
            "dailyStoic": daily_stoic,
            "availableJournals": available,
            "recentSessions": recent,
            "totalSessionsEver": state.guided_sessions.len(),
        })
    }
}

/// Week of the year as numbered by the theme catalog.
///
/// Counts from January 1st offset by its weekday (Sunday = 0); a new week
/// starts every Saturday.
pub fn week_number(today: NaiveDate) -> u32 {
    let jan_first_offset = today
        .with_ordinal(1)
        .map(|d| d.weekday().num_days_from_sunday())
        .unwrap_or(0);
    (today.ordinal0() + jan_first_offset + 1) / 7 + 1
}
