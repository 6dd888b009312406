//! Builds the instruction text a chat is seeded with.

use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::store::AppState;
use crate::tools::journal::{week_number, JournalCatalog};

/// Persona used when the user has not written their own.
pub const DEFAULT_PERSONA: &str = "You are Signal, the thinking partner for \"Personal Growth OS\".

Your purpose is to help the user clarify intent, reflect accurately, and keep the system honest. You are not a coach, motivator, therapist, or performance analyst.

The user owns all decisions. Language comes before metrics and reflection comes before optimization. Label any interpretation of the user's intent or values as a hypothesis.

You have tools to read and modify app state. Use them conservatively and never invent goals, habits, or key results unprompted.

Tone: calm, precise, adult, slightly austere. Short paragraphs. No emojis or motivational language.";

const MEMORY_PROTOCOL: &str = "MEMORY PROTOCOL
When the user shares a lasting detail about themselves (job, values, life events, strong preferences), call 'rememberFact'. Do not store trivia. Use the memory IDs above with 'forgetFact' when the user asks you to forget something.";

const CALENDAR_PROTOCOL: &str = "CALENDAR PROTOCOL
To schedule, call 'addCalendarEvent' directly. To change or remove an event, call 'listCalendarEvents' first to find its eventId. If a calendar tool reports missing permission, tell the user to sign out and sign in again.";

const JOURNAL_PROTOCOL: &str = "JOURNAL PROTOCOL
For today's Stoic prompt, guided journal progress, or recent journaling sessions, call 'getJournalContext'.";

const TOOL_NOTE: &str = "NOTE: You have access to the full user state via the 'getAppState' tool. If the user asks about specific habits, logs, or goals, USE THE TOOL to get the details. To store new important facts, use 'rememberFact'. For journal details, use 'getJournalContext'.";

const SUGGESTION_PROTOCOL: &str = "SUGGESTION PROTOCOL
At the end of a text response, and only when you are not calling a tool, append exactly 3 short follow-up options phrased as the user speaking to you (under 6 words each). Wrap each one in <suggest>...</suggest> tags on its own line. No bullets or numbers.

Example:
<suggest>Log this as a win</suggest>
<suggest>How to improve focus?</suggest>
<suggest>Check my weekly stats</suggest>";

const CONFIRMATION_PROTOCOL: &str = "CRITICAL PROTOCOL: Do not ask for verbal confirmation before calling a tool. If the user asks to modify data (add/edit/delete) or shares new important life details (calling for memory storage), call the tool immediately. The system will trigger a UI confirmation card automatically.";

/// Instruction text for a new chat, built from the current state.
pub fn assemble(state: &AppState, catalog: &JournalCatalog, today: NaiveDate) -> String {
    let persona = if state.system_prompt.trim().is_empty() {
        DEFAULT_PERSONA
    } else {
        state.system_prompt.as_str()
    };

    let (name, email) = match &state.user {
        Some(user) => (non_empty(&user.name, "User"), non_empty(&user.email, "Unknown")),
        None => ("User", "Unknown"),
    };
    let (last_date, last_mood) = match state.last_log() {
        Some(log) => (log.date.to_string(), log.mood.to_string()),
        None => ("None".to_string(), "Unknown".to_string()),
    };
    let week = week_number(today);

    let mut out = String::with_capacity(persona.len() + 2048);
    out.push_str(persona);
    // Writing to a String cannot fail.
    let _ = write!(
        out,
        "\n\nUSER IDENTITY:\nName: {name}\nEmail: {email}\nCurrent Date: {date}\n\n\
         CONTEXT SUMMARY:\nActive Habits: {habits}\nActive Objectives: {objectives}\n\
         Last Check-in: {last_date} (Mood: {last_mood})\n\n\
         JOURNAL CONTEXT:\nGuided Sessions Completed: {sessions}\nJournal Progress: {progress}\n\
         This Week's Theme: Week {week}: {theme}\n\n\
         SIGNALS MEMORY (LONG-TERM):\n{memories}\n\n\
         {MEMORY_PROTOCOL}\n\n{CALENDAR_PROTOCOL}\n\n{JOURNAL_PROTOCOL}\n\n{TOOL_NOTE}\n\n\
         {SUGGESTION_PROTOCOL}\n\n{CONFIRMATION_PROTOCOL}",
        date = today.format("%B %-d, %Y"),
        habits = state.active_habit_count(),
        objectives = state.active_objective_count(),
        sessions = state.guided_sessions.len(),
        progress = catalog.progress_summary(state),
        theme = catalog.theme_for_week(week),
        memories = memory_lines(state),
    );
    out
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn memory_lines(state: &AppState) -> String {
    if state.memories.is_empty() {
        return "No long-term memories stored yet.".to_string();
    }
    state
        .memories
        .iter()
        .map(|m| {
            format!(
                "- [{}] {} (ID: {})",
                m.category.to_string().to_uppercase(),
                m.content,
                m.id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DailyLog, Habit, LogType, Memory, MemoryCategory, User};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
    }

    #[test]
    fn empty_state_uses_defaults() {
        let text = assemble(&AppState::default(), &JournalCatalog::default(), today());

        assert!(text.starts_with(DEFAULT_PERSONA));
        assert!(text.contains("Name: User\nEmail: Unknown"));
        assert!(text.contains("Current Date: March 4, 2025"));
        assert!(text.contains("Last Check-in: None (Mood: Unknown)"));
        assert!(text.contains("Journal Progress: None yet"));
        assert!(text.contains("This Week's Theme: Week 10: Reflection"));
        assert!(text.contains("No long-term memories stored yet."));
        assert!(text.contains("<suggest>"));
        assert!(text.ends_with(CONFIRMATION_PROTOCOL));
    }

    #[test]
    fn reflects_user_state() {
        let mut state = AppState {
            system_prompt: "You are Atlas.".into(),
            user: Some(User {
                id: "u1".into(),
                email: "ada@example.com".into(),
                name: "Ada".into(),
            }),
            ..Default::default()
        };
        state.habits.push(Habit {
            id: "h1".into(),
            name: "Read".into(),
            category: LogType::Mind,
            active: true,
        });
        state.logs.push(DailyLog {
            date: today(),
            mood: 4,
            energy: 3,
            deep_work_minutes: 0,
            reps: Default::default(),
            reflection: Default::default(),
            habits_completed: vec![],
        });
        state.memories.push(Memory {
            id: "m1".into(),
            content: "Works as a nurse".into(),
            category: MemoryCategory::Identity,
            added_at: chrono::Utc::now(),
        });

        let text = assemble(&state, &JournalCatalog::default(), today());

        assert!(text.starts_with("You are Atlas."));
        assert!(!text.contains(DEFAULT_PERSONA));
        assert!(text.contains("Name: Ada\nEmail: ada@example.com"));
        assert!(text.contains("Active Habits: 1\nActive Objectives: 0"));
        assert!(text.contains("Last Check-in: 2025-03-04 (Mood: 4)"));
        assert!(text.contains("- [IDENTITY] Works as a nurse (ID: m1)"));
    }
}
