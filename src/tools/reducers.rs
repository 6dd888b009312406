//! Pure state transitions behind the mutating tools.
//!
//! Each reducer reads the snapshot it is given and returns the next state
//! plus the summary the model reads. Name lookups happen inside the reducer
//! so the match and the change always refer to the same snapshot.

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};

use crate::store::{
    AppState, DailyLog, Habit, KeyResult, LogType, Memory, MemoryCategory, Objective, Reduction,
    Reflection, Reps,
};

use super::command::{CheckIn, HabitUpdate, KeyResultUpdate, ObjectiveUpdate};
use super::error::ToolError;
use super::fuzzy::find_match;

const DEFAULT_SCORE: u8 = 3;
const NEW_KEY_RESULT_PROGRESS: &str = "Not started";

/// Identity and clock inputs for a reducer, fixed before the commit.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamp {
    pub id: String,
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

impl Stamp {
    pub fn now() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            today: Local::now().date_naive(),
            now: Utc::now(),
        }
    }
}

/// Merge a partial check-in into today's record.
///
/// Each field takes the supplied value, else the stored one, else the
/// default. An empty reflection string is a supplied value and clears the
/// stored text. The merged record replaces any record for the same date.
///
/// `today` comes from [`Stamp::now`], which uses the local calendar date;
/// between local midnight and UTC midnight it differs from a UTC-keyed log.
pub fn log_check_in(state: &AppState, check_in: &CheckIn, today: NaiveDate) -> Reduction {
    let existing = state.log_for(today);
    let reps = existing.map(|l| l.reps).unwrap_or_default();
    let reflection = existing.map(|l| l.reflection.clone()).unwrap_or_default();

    let merged = DailyLog {
        date: today,
        mood: check_in
            .mood
            .or(existing.map(|l| l.mood))
            .unwrap_or(DEFAULT_SCORE),
        energy: check_in
            .energy
            .or(existing.map(|l| l.energy))
            .unwrap_or(DEFAULT_SCORE),
        deep_work_minutes: check_in
            .deep_work_minutes
            .unwrap_or(existing.map(|l| l.deep_work_minutes).unwrap_or(0)),
        reps: Reps {
            presence: check_in.presence_rep.unwrap_or(reps.presence),
            build: check_in.build_rep.unwrap_or(reps.build),
            workout: check_in.workout_rep.unwrap_or(reps.workout),
        },
        reflection: Reflection {
            win: check_in.win.clone().unwrap_or(reflection.win),
            lesson: check_in.lesson.clone().unwrap_or(reflection.lesson),
            priority: check_in.priority.clone().unwrap_or(reflection.priority),
        },
        habits_completed: existing
            .map(|l| l.habits_completed.clone())
            .unwrap_or_default(),
    };

    let mut next = state.clone();
    next.logs.retain(|l| l.date != today);
    next.logs.push(merged);
    Reduction::new(next, "Daily log updated.")
}

pub fn add_habit(state: &AppState, name: &str, category: LogType, stamp: &Stamp) -> Reduction {
    let mut next = state.clone();
    next.habits.push(Habit {
        id: stamp.id.clone(),
        name: name.to_string(),
        category,
        active: true,
    });
    Reduction::new(next, format!("Habit '{name}' created."))
}

pub fn update_habit(state: &AppState, update: &HabitUpdate) -> Result<Reduction, ToolError> {
    let (index, found) = find_match(&state.habits, &update.target, |h| h.name.as_str())
        .ok_or_else(|| ToolError::not_found("Habit", &update.target))?;
    let message = format!("Habit \"{}\" updated.", found.name);

    let mut next = state.clone();
    let habit = &mut next.habits[index];
    if let Some(name) = &update.name {
        habit.name = name.clone();
    }
    if let Some(category) = update.category {
        habit.category = category;
    }
    if let Some(active) = update.active {
        habit.active = active;
    }
    Ok(Reduction::new(next, message))
}

pub fn remove_habit(state: &AppState, fragment: &str) -> Result<Reduction, ToolError> {
    let (index, found) = find_match(&state.habits, fragment, |h| h.name.as_str())
        .ok_or_else(|| ToolError::not_found("Habit", fragment))?;
    let message = format!("Habit \"{}\" removed.", found.name);

    let mut next = state.clone();
    next.habits.remove(index);
    Ok(Reduction::new(next, message))
}

pub fn add_objective(
    state: &AppState,
    title: &str,
    theme: LogType,
    why: &str,
    stamp: &Stamp,
) -> Reduction {
    let mut next = state.clone();
    next.objectives.push(Objective {
        id: stamp.id.clone(),
        year: stamp.today.year(),
        theme,
        title: title.to_string(),
        why: why.to_string(),
        active: true,
        key_results: Vec::new(),
    });
    Reduction::new(next, "Objective added.")
}

fn find_objective(state: &AppState, fragment: &str) -> Result<usize, ToolError> {
    find_match(&state.objectives, fragment, |o| o.title.as_str())
        .map(|(index, _)| index)
        .ok_or_else(|| ToolError::not_found("Objective", fragment))
}

pub fn update_objective(state: &AppState, update: &ObjectiveUpdate) -> Result<Reduction, ToolError> {
    let index = find_objective(state, &update.target)?;

    let mut next = state.clone();
    let objective = &mut next.objectives[index];
    if let Some(title) = &update.title {
        objective.title = title.clone();
    }
    if let Some(theme) = update.theme {
        objective.theme = theme;
    }
    if let Some(why) = &update.why {
        objective.why = why.clone();
    }
    if let Some(active) = update.active {
        objective.active = active;
    }
    Ok(Reduction::new(next, "Objective updated."))
}

/// Removes the objective together with its key results.
pub fn remove_objective(state: &AppState, fragment: &str) -> Result<Reduction, ToolError> {
    let index = find_objective(state, fragment)?;
    let mut next = state.clone();
    let removed = next.objectives.remove(index);
    Ok(Reduction::new(
        next,
        format!("Objective \"{}\" removed.", removed.title),
    ))
}

pub fn add_key_result(
    state: &AppState,
    objective: &str,
    title: &str,
    target: &str,
    stamp: &Stamp,
) -> Result<Reduction, ToolError> {
    let index = find_objective(state, objective)?;
    let mut next = state.clone();
    next.objectives[index].key_results.push(KeyResult {
        id: stamp.id.clone(),
        title: title.to_string(),
        target: target.to_string(),
        current: NEW_KEY_RESULT_PROGRESS.to_string(),
        confidence: DEFAULT_SCORE,
    });
    Ok(Reduction::new(next, "Key Result added."))
}

pub fn update_key_result(state: &AppState, update: &KeyResultUpdate) -> Result<Reduction, ToolError> {
    let index = find_objective(state, &update.objective)?;
    let key_results = &state.objectives[index].key_results;
    let (kr_index, _) = find_match(key_results, &update.target, |k| k.title.as_str())
        .ok_or_else(|| ToolError::not_found("Key Result", &update.target))?;

    let mut next = state.clone();
    let kr = &mut next.objectives[index].key_results[kr_index];
    if let Some(title) = &update.title {
        kr.title = title.clone();
    }
    if let Some(target) = &update.target_value {
        kr.target = target.clone();
    }
    if let Some(current) = &update.current {
        kr.current = current.clone();
    }
    if let Some(confidence) = update.confidence {
        kr.confidence = confidence;
    }
    Ok(Reduction::new(next, "Key Result updated."))
}

pub fn remove_key_result(
    state: &AppState,
    objective: &str,
    fragment: &str,
) -> Result<Reduction, ToolError> {
    let index = find_objective(state, objective)?;
    let key_results = &state.objectives[index].key_results;
    let (kr_index, _) = find_match(key_results, fragment, |k| k.title.as_str())
        .ok_or_else(|| ToolError::KeyResultNotFound {
            objective: objective.to_string(),
            fragment: fragment.to_string(),
        })?;

    let mut next = state.clone();
    next.objectives[index].key_results.remove(kr_index);
    Ok(Reduction::new(next, "Key Result removed."))
}

pub fn remember_fact(state: &AppState, fact: &str, category: MemoryCategory, stamp: &Stamp) -> Reduction {
    let mut next = state.clone();
    next.memories.push(Memory {
        id: stamp.id.clone(),
        content: fact.to_string(),
        category,
        added_at: stamp.now,
    });
    Reduction::new(next, "Memory stored.")
}

/// Removing an id that is not stored still succeeds.
pub fn forget_fact(state: &AppState, memory_id: &str) -> Reduction {
    let mut next = state.clone();
    next.memories.retain(|m| m.id != memory_id);
    Reduction::new(next, "Memory removed.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stamp(id: &str) -> Stamp {
        Stamp {
            id: id.to_string(),
            today: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            now: Utc::now(),
        }
    }

    fn with_habits(names: &[&str]) -> AppState {
        let mut state = AppState::default();
        for (i, name) in names.iter().enumerate() {
            state = add_habit(&state, name, LogType::Health, &stamp(&i.to_string())).state;
        }
        state
    }

    fn with_objective() -> AppState {
        let state = add_objective(&AppState::default(), "Get Fit", LogType::Health, "energy", &stamp("o1")).state;
        add_key_result(&state, "fit", "Run a 10k", "Sub 50 min", &stamp("k1"))
            .unwrap()
            .state
    }

    #[test]
    fn sequential_check_ins_merge_into_one_record() {
        let today = stamp("x").today;
        let first = log_check_in(
            &AppState::default(),
            &CheckIn {
                mood: Some(4),
                ..Default::default()
            },
            today,
        );
        let second = log_check_in(
            &first.state,
            &CheckIn {
                energy: Some(2),
                win: Some("Shipped".into()),
                ..Default::default()
            },
            today,
        );

        assert_eq!(second.state.logs.len(), 1);
        let log = &second.state.logs[0];
        assert_eq!((log.mood, log.energy), (4, 2));
        assert_eq!(log.deep_work_minutes, 0);
        assert_eq!(log.reflection.win, "Shipped");
        assert_eq!(second.message, "Daily log updated.");
    }

    #[test]
    fn empty_win_clears_the_stored_reflection() {
        let today = stamp("x").today;
        let first = log_check_in(
            &AppState::default(),
            &CheckIn {
                win: Some("Shipped".into()),
                lesson: Some("Rest more".into()),
                ..Default::default()
            },
            today,
        );
        let second = log_check_in(
            &first.state,
            &CheckIn {
                win: Some(String::new()),
                ..Default::default()
            },
            today,
        );

        let reflection = &second.state.logs[0].reflection;
        assert_eq!(reflection.win, "");
        assert_eq!(reflection.lesson, "Rest more");
    }

    #[test]
    fn check_in_keeps_completed_habits_and_other_days() {
        let today = stamp("x").today;
        let mut state = AppState::default();
        state.logs.push(DailyLog {
            date: today.pred_opt().unwrap(),
            mood: 1,
            energy: 1,
            deep_work_minutes: 0,
            reps: Reps::default(),
            reflection: Reflection::default(),
            habits_completed: vec![],
        });
        state.logs.push(DailyLog {
            date: today,
            mood: 5,
            energy: 5,
            deep_work_minutes: 30,
            reps: Reps {
                presence: true,
                ..Default::default()
            },
            reflection: Reflection::default(),
            habits_completed: vec!["h1".into()],
        });

        let next = log_check_in(&state, &CheckIn::default(), today).state;

        assert_eq!(next.logs.len(), 2);
        let merged = next.log_for(today).unwrap();
        assert_eq!(merged.habits_completed, vec!["h1".to_string()]);
        assert!(merged.reps.presence);
        assert_eq!(merged.deep_work_minutes, 30);
    }

    #[test]
    fn fuzzy_update_targets_first_stored_match() {
        let state = with_habits(&["Morning Run", "Morning Pages"]);
        let reduced = update_habit(
            &state,
            &HabitUpdate {
                target: "morning".into(),
                name: None,
                category: None,
                active: Some(false),
            },
        )
        .unwrap();

        assert!(!reduced.state.habits[0].active);
        assert!(reduced.state.habits[1].active);
        assert_eq!(reduced.message, "Habit \"Morning Run\" updated.");
    }

    #[test]
    fn missing_habit_leaves_error_naming_fragment() {
        let err = remove_habit(&with_habits(&["Read"]), "swim").unwrap_err();
        assert_eq!(err.to_string(), "Habit similar to \"swim\" not found.");
    }

    #[test]
    fn new_key_results_start_not_started() {
        let state = with_objective();
        let kr = &state.objectives[0].key_results[0];
        assert_eq!(kr.current, "Not started");
        assert_eq!(kr.confidence, 3);
        assert_eq!(state.objectives[0].year, 2025);
    }

    #[test]
    fn key_result_errors_distinguish_objective_and_kr() {
        let state = with_objective();

        let missing_objective = remove_key_result(&state, "wealth", "10k").unwrap_err();
        assert!(matches!(missing_objective, ToolError::NotFound { ref what, .. } if what == "Objective"));

        let missing_kr = remove_key_result(&state, "fit", "marathon").unwrap_err();
        assert_eq!(
            missing_kr.to_string(),
            "Key Result similar to \"marathon\" not found in objective \"fit\"."
        );
    }

    #[test]
    fn update_key_result_only_touches_supplied_fields() {
        let state = with_objective();
        let next = update_key_result(
            &state,
            &KeyResultUpdate {
                objective: "get fit".into(),
                target: "10K".into(),
                title: None,
                target_value: None,
                current: Some("5k done".into()),
                confidence: Some(4),
            },
        )
        .unwrap()
        .state;

        let kr = &next.objectives[0].key_results[0];
        assert_eq!(kr.title, "Run a 10k");
        assert_eq!(kr.target, "Sub 50 min");
        assert_eq!(kr.current, "5k done");
        assert_eq!(kr.confidence, 4);
    }

    #[test]
    fn removing_objective_drops_its_key_results() {
        let next = remove_objective(&with_objective(), "FIT").unwrap();
        assert!(next.state.objectives.is_empty());
        assert_eq!(next.message, "Objective \"Get Fit\" removed.");
    }

    #[test]
    fn forgetting_unknown_memory_is_a_no_op_success() {
        let state = remember_fact(&AppState::default(), "Has a dog", MemoryCategory::Other, &stamp("m1")).state;

        let unchanged = forget_fact(&state, "nope");
        assert_eq!(unchanged.state.memories.len(), 1);

        let removed = forget_fact(&state, "m1");
        assert!(removed.state.memories.is_empty());
        assert_eq!(removed.message, "Memory removed.");
    }
}
