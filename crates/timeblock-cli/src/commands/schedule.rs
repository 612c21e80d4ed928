use clap::Args;
use timeblock_core::{Config, CoreError, ScheduleError, ScheduleOptions};

use super::common;

#[derive(Args)]
pub struct ScheduleArgs {
    /// Task id (or a unique id prefix)
    pub task_id: String,
    /// Explicit start time, `YYYY-MM-DDTHH:MM` in the configured timezone
    /// (default: now, rounded up to the next 5-minute slot)
    #[arg(long)]
    pub at: Option<String>,
    /// Leave the task open instead of marking it completed
    #[arg(long)]
    pub keep_open: bool,
}

pub fn run(args: ScheduleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut session = common::open_loaded_session(&config)?;

    let start = args
        .at
        .as_deref()
        .map(|text| common::parse_start(text, session.timezone()))
        .transpose()?;

    let options = ScheduleOptions {
        mark_complete: !args.keep_open,
        start,
    };
    match session.schedule(&args.task_id, options) {
        Ok(outcome) => {
            println!(
                "Scheduled '{}' from {} to {}",
                args.task_id,
                outcome.start.with_timezone(&session.timezone()),
                outcome.end.with_timezone(&session.timezone())
            );
            if let Some(link) = &outcome.event.html_link {
                println!("{link}");
            }
            if outcome.completed {
                println!("Task marked completed");
            }
            Ok(())
        }
        // The calendar event exists; say so before surfacing the failure.
        Err(e @ CoreError::Schedule(ScheduleError::CompletionAfterEvent { .. })) => {
            if let CoreError::Schedule(ScheduleError::CompletionAfterEvent { event, .. }) = &e {
                println!("Calendar event '{}' was created", event.id);
                if let Some(link) = &event.html_link {
                    println!("{link}");
                }
            }
            Err(Box::new(e))
        }
        Err(e) => Err(Box::new(e)),
    }
}
