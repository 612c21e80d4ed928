use std::collections::BTreeSet;

use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use timeblock_core::{Config, EnergyLevel, TimeBudget, TriageFilter, TriageMode};

use super::common;

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    All,
    Inbox,
    DueToday,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum EnergyArg {
    Low,
    Medium,
    High,
}

#[derive(Args)]
pub struct TasksArgs {
    /// Time budget in minutes; tasks with unknown duration are excluded
    #[arg(long, conflicts_with = "no_limit")]
    pub minutes: Option<u32>,
    /// No time budget (the default)
    #[arg(long)]
    pub no_limit: bool,
    /// Selection mode
    #[arg(long, value_enum, default_value_t = ModeArg::All)]
    pub mode: ModeArg,
    /// Only tasks due on this exact date
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub on: Option<NaiveDate>,
    /// Comma-separated tag filter (with or without '#')
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,
    /// Advisory energy level; shown, never used to exclude tasks
    #[arg(long, value_enum, default_value_t = EnergyArg::Medium)]
    pub energy: EnergyArg,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl TasksArgs {
    pub fn filter(&self) -> TriageFilter {
        TriageFilter {
            budget: match self.minutes {
                Some(minutes) => TimeBudget::Minutes(minutes),
                None => TimeBudget::NoLimit,
            },
            energy: match self.energy {
                EnergyArg::Low => EnergyLevel::Low,
                EnergyArg::Medium => EnergyLevel::Medium,
                EnergyArg::High => EnergyLevel::High,
            },
            mode: match self.mode {
                ModeArg::All => TriageMode::All,
                ModeArg::Inbox => TriageMode::InboxOnly,
                ModeArg::DueToday => TriageMode::DueToday,
            },
            on_date: self.on,
            tags: if self.tags.is_empty() {
                None
            } else {
                Some(self.tags.iter().cloned().collect::<BTreeSet<String>>())
            },
        }
    }
}

pub fn run(args: TasksArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let session = common::open_loaded_session(&config)?;
    let tz = session.timezone();

    let filter = args.filter();
    let selected = session.select(&filter);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }

    if selected.is_empty() {
        println!("No tasks fit the current filter ({}).", filter.energy.badge());
        return Ok(());
    }

    println!("{} candidate(s), {}:", selected.len(), filter.energy.badge());
    for task in selected {
        let duration = task
            .duration_min
            .map(|m| format!("{m}m"))
            .unwrap_or_else(|| "?".into());
        let project = if task.project.trim().is_empty() {
            "Inbox"
        } else {
            task.project.as_str()
        };
        let due = task
            .due_date(tz)
            .map(|d| format!("  due {d}"))
            .unwrap_or_default();
        let mut flags = String::new();
        if task.is_overdue {
            flags.push_str("  [overdue]");
        }
        if task.is_routine {
            flags.push_str("  [routine]");
        }
        println!("{}  {:>5}  {}  ({project}){due}{flags}", task.id, duration, task.title);
    }
    Ok(())
}
