//! Filter/rank engine.
//!
//! Candidate selection against an ephemeral, per-invocation filter: time
//! budget, mode, optional exact date, optional tag set. Filters AND-compose
//! and the normalizer's stable ordering is preserved, never re-sorted.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::debug;

use crate::task::Task;

/// Project names treated as the unsorted inbox, compared after trimming,
/// case-folding, and diacritic folding. An empty project name is inbox too.
pub const INBOX_ALIASES: &[&str] = &[
    "inbox",
    "my tasks",
    "tasks",
    "to do",
    "todo",
    "tareas",
    "mis tareas",
    "bandeja de entrada",
];

/// User-declared time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeBudget {
    /// No limit: every task passes the time check, unknown durations included.
    #[default]
    NoLimit,
    /// A concrete commitment: only tasks with a known duration within the
    /// budget pass. Unknown durations are excluded on purpose; the budget
    /// cannot be satisfied by an estimate the system could not make.
    Minutes(u32),
}

/// Advisory energy level. Displayed, never used to exclude tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnergyLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl EnergyLevel {
    /// Friendly label for display surfaces.
    pub fn badge(self) -> &'static str {
        match self {
            EnergyLevel::Low => "low lift",
            EnergyLevel::Medium => "medium energy",
            EnergyLevel::High => "high focus",
        }
    }
}

/// Mutually exclusive selection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriageMode {
    #[default]
    All,
    InboxOnly,
    DueToday,
}

/// Ephemeral filter state, scoped to one invocation.
#[derive(Debug, Clone, Default)]
pub struct TriageFilter {
    pub budget: TimeBudget,
    pub energy: EnergyLevel,
    pub mode: TriageMode,
    /// Keep only tasks due on exactly this date. A task with no due date
    /// never matches a concrete date.
    pub on_date: Option<NaiveDate>,
    /// Keep only tasks whose tag set intersects this one. Entries may be
    /// given with or without the leading `#`.
    pub tags: Option<BTreeSet<String>>,
}

/// Select the ordered subset of `tasks` passing the filter.
pub fn select<'a>(
    tasks: &'a [Task],
    filter: &TriageFilter,
    today: NaiveDate,
    tz: Tz,
) -> Vec<&'a Task> {
    let filter_tags: Option<BTreeSet<String>> = filter.tags.as_ref().map(|tags| {
        tags.iter()
            .map(|t| t.trim_start_matches('#').to_lowercase())
            .collect()
    });

    let selected: Vec<&Task> = tasks
        .iter()
        .filter(|task| passes_budget(task, filter.budget))
        .filter(|task| passes_mode(task, filter.mode, today, tz))
        .filter(|task| match filter.on_date {
            Some(date) => task.due_date(tz) == Some(date),
            None => true,
        })
        .filter(|task| match &filter_tags {
            Some(wanted) => !task.tags().is_disjoint(wanted),
            None => true,
        })
        .collect();

    debug!(
        total = tasks.len(),
        selected = selected.len(),
        energy = filter.energy.badge(),
        "triage selection"
    );
    selected
}

fn passes_budget(task: &Task, budget: TimeBudget) -> bool {
    match budget {
        TimeBudget::NoLimit => true,
        TimeBudget::Minutes(limit) => match task.duration_min {
            Some(minutes) => minutes <= limit,
            None => false,
        },
    }
}

fn passes_mode(task: &Task, mode: TriageMode, today: NaiveDate, tz: Tz) -> bool {
    match mode {
        TriageMode::All => true,
        TriageMode::InboxOnly => is_inbox_name(&task.project),
        TriageMode::DueToday => task.due_date(tz) == Some(today),
    }
}

/// Whether a project name denotes the inbox.
pub fn is_inbox_name(name: &str) -> bool {
    let folded = fold_name(name);
    folded.is_empty() || INBOX_ALIASES.contains(&folded.as_str())
}

/// Trim, case-fold, and strip the diacritics that show up in localized
/// default list names ("Mis tareas", "Bandeja de entrada").
fn fold_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(fold_char)
        .collect()
}

fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn task(id: &str, title: &str, project: &str, duration_min: Option<u32>) -> Task {
        Task {
            id: id.into(),
            title: title.into(),
            notes: None,
            project: project.into(),
            tasklist: "l1".into(),
            duration_min,
            due: None,
            is_routine: false,
            is_overdue: false,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn ids(selected: &[&Task]) -> Vec<String> {
        selected.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn concrete_budget_excludes_unknown_durations() {
        let tasks = vec![
            task("short", "a 20m", "Work", Some(20)),
            task("long", "b 2h", "Work", Some(120)),
            task("unknown", "c", "Work", None),
        ];
        let filter = TriageFilter {
            budget: TimeBudget::Minutes(60),
            ..TriageFilter::default()
        };
        assert_eq!(ids(&select(&tasks, &filter, today(), Tz::UTC)), vec!["short"]);
    }

    #[test]
    fn no_limit_includes_unknown_durations() {
        let tasks = vec![
            task("a", "a", "Work", Some(240)),
            task("b", "b", "Work", None),
        ];
        let filter = TriageFilter::default();
        assert_eq!(select(&tasks, &filter, today(), Tz::UTC).len(), 2);
    }

    #[test]
    fn due_today_mode_keeps_only_today() {
        let mut due_today = task("today", "a", "Work", None);
        due_today.due = Some(Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap());
        let mut due_tomorrow = task("tomorrow", "b", "Work", None);
        due_tomorrow.due = Some(Utc.with_ymd_and_hms(2024, 6, 16, 9, 0, 0).unwrap());
        let no_due = task("none", "c", "Work", None);

        let filter = TriageFilter {
            mode: TriageMode::DueToday,
            ..TriageFilter::default()
        };
        let tasks = vec![due_today, due_tomorrow, no_due];
        assert_eq!(ids(&select(&tasks, &filter, today(), Tz::UTC)), vec!["today"]);
    }

    #[test]
    fn inbox_mode_matches_aliases_and_empty() {
        let tasks = vec![
            task("a", "a", "Inbox", None),
            task("b", "b", "  Mis Tareas ", None),
            task("c", "c", "Bandeja de entrada", None),
            task("d", "d", "", None),
            task("e", "e", "Deep Work", None),
        ];
        let filter = TriageFilter {
            mode: TriageMode::InboxOnly,
            ..TriageFilter::default()
        };
        assert_eq!(
            ids(&select(&tasks, &filter, today(), Tz::UTC)),
            vec!["a", "b", "c", "d"]
        );
    }

    #[test]
    fn exact_date_never_matches_missing_due() {
        let mut dated = task("dated", "a", "Work", None);
        dated.due = Some(Utc.with_ymd_and_hms(2024, 6, 20, 12, 0, 0).unwrap());
        let undated = task("undated", "b", "Work", None);

        let filter = TriageFilter {
            on_date: NaiveDate::from_ymd_opt(2024, 6, 20),
            ..TriageFilter::default()
        };
        let tasks = vec![dated, undated];
        assert_eq!(ids(&select(&tasks, &filter, today(), Tz::UTC)), vec!["dated"]);
    }

    #[test]
    fn tag_filter_needs_a_non_empty_intersection() {
        let tasks = vec![
            task("hit", "ship it #work #Urgent", "Work", None),
            task("miss", "garden #home", "Work", None),
        ];
        let filter = TriageFilter {
            tags: Some(BTreeSet::from(["#urgent".to_string()])),
            ..TriageFilter::default()
        };
        assert_eq!(ids(&select(&tasks, &filter, today(), Tz::UTC)), vec!["hit"]);
    }

    #[test]
    fn energy_level_never_changes_membership() {
        let tasks = vec![task("a", "a 2h", "Work", Some(120))];
        for energy in [EnergyLevel::Low, EnergyLevel::Medium, EnergyLevel::High] {
            let filter = TriageFilter {
                energy,
                ..TriageFilter::default()
            };
            assert_eq!(select(&tasks, &filter, today(), Tz::UTC).len(), 1);
        }
    }

    #[test]
    fn filters_compose_with_and() {
        let mut a = task("a", "deploy #ops 30m", "Inbox", Some(30));
        a.due = Some(Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap());
        let b = task("b", "deploy #ops 30m", "Deep Work", Some(30));

        let filter = TriageFilter {
            budget: TimeBudget::Minutes(45),
            mode: TriageMode::InboxOnly,
            tags: Some(BTreeSet::from(["ops".to_string()])),
            ..TriageFilter::default()
        };
        let tasks = vec![a, b];
        assert_eq!(ids(&select(&tasks, &filter, today(), Tz::UTC)), vec!["a"]);
    }

    #[test]
    fn order_of_input_is_preserved() {
        let tasks = vec![
            task("z", "zulu", "Work", Some(10)),
            task("a", "alpha", "Work", Some(10)),
        ];
        let filter = TriageFilter::default();
        assert_eq!(ids(&select(&tasks, &filter, today(), Tz::UTC)), vec!["z", "a"]);
    }
}
