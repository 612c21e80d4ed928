use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "timeblock", version, about = "Task triage and time blocking from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Google authentication
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// List task lists (projects)
    Lists(commands::lists::ListsArgs),
    /// Load and triage open tasks
    Tasks(commands::tasks::TasksArgs),
    /// Schedule a task into a calendar slot
    Schedule(commands::schedule::ScheduleArgs),
    /// Defer a task's due date
    Snooze(commands::snooze::SnoozeArgs),
    /// Move a task to another list
    Move(commands::move_task::MoveArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() {
    // stderr only, so stdout stays machine-readable for --json output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("timeblock=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Lists(args) => commands::lists::run(args),
        Commands::Tasks(args) => commands::tasks::run(args),
        Commands::Schedule(args) => commands::schedule::run(args),
        Commands::Snooze(args) => commands::snooze::run(args),
        Commands::Move(args) => commands::move_task::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "timeblock", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeblock_core::{TimeBudget, TriageMode};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn tasks_flags_parse() {
        let cli = Cli::try_parse_from([
            "timeblock", "tasks", "--minutes", "45", "--mode", "inbox", "--tags", "work,urgent",
            "--energy", "high", "--json",
        ])
        .unwrap();
        let Commands::Tasks(args) = cli.command else {
            panic!("expected tasks subcommand");
        };
        assert_eq!(args.minutes, Some(45));
        assert!(args.json);
        assert_eq!(args.tags, vec!["work".to_string(), "urgent".to_string()]);

        let filter = args.filter();
        assert_eq!(filter.budget, TimeBudget::Minutes(45));
        assert_eq!(filter.mode, TriageMode::InboxOnly);
        assert_eq!(filter.tags.as_ref().map(|t| t.len()), Some(2));
    }

    #[test]
    fn tasks_minutes_and_no_limit_conflict() {
        assert!(Cli::try_parse_from(["timeblock", "tasks", "--minutes", "30", "--no-limit"]).is_err());
    }

    #[test]
    fn tasks_defaults_to_no_limit_and_all_mode() {
        let cli = Cli::try_parse_from(["timeblock", "tasks"]).unwrap();
        let Commands::Tasks(args) = cli.command else {
            panic!("expected tasks subcommand");
        };
        let filter = args.filter();
        assert_eq!(filter.budget, TimeBudget::NoLimit);
        assert_eq!(filter.mode, TriageMode::All);
        assert!(filter.tags.is_none());
        assert!(filter.on_date.is_none());
    }

    #[test]
    fn tasks_on_date_parses() {
        let cli = Cli::try_parse_from(["timeblock", "tasks", "--on", "2024-06-20"]).unwrap();
        let Commands::Tasks(args) = cli.command else {
            panic!("expected tasks subcommand");
        };
        assert_eq!(
            args.on,
            Some(chrono::NaiveDate::from_ymd_opt(2024, 6, 20).unwrap())
        );
    }

    #[test]
    fn schedule_accepts_explicit_start_and_keep_open() {
        let cli = Cli::try_parse_from([
            "timeblock", "schedule", "t1", "--at", "2024-06-20T09:30", "--keep-open",
        ])
        .unwrap();
        let Commands::Schedule(args) = cli.command else {
            panic!("expected schedule subcommand");
        };
        assert_eq!(args.task_id, "t1");
        assert!(args.keep_open);
        assert_eq!(args.at.as_deref(), Some("2024-06-20T09:30"));
    }

    #[test]
    fn snooze_requires_exactly_one_target() {
        assert!(Cli::try_parse_from(["timeblock", "snooze", "t1"]).is_err());
        assert!(Cli::try_parse_from([
            "timeblock", "snooze", "t1", "--days", "3", "--until", "2024-06-20"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["timeblock", "snooze", "t1", "--days", "3"]).is_ok());
        assert!(
            Cli::try_parse_from(["timeblock", "snooze", "t1", "--until", "2024-06-20"]).is_ok()
        );
    }

    #[test]
    fn move_requires_destination() {
        assert!(Cli::try_parse_from(["timeblock", "move", "t1"]).is_err());
        assert!(Cli::try_parse_from(["timeblock", "move", "t1", "--to", "Work"]).is_ok());
    }
}
