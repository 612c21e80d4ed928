use chrono::{NaiveDate, Utc};
use clap::Args;
use timeblock_core::{clock, scheduling, Config};

use super::common;

#[derive(Args)]
pub struct SnoozeArgs {
    /// Task id (or a unique id prefix)
    pub task_id: String,
    /// Days to defer (>= 1)
    #[arg(long, conflicts_with = "until", required_unless_present = "until", value_parser = clap::value_parser!(u32).range(1..))]
    pub days: Option<u32>,
    /// Defer until this date; always at least one day forward
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub until: Option<NaiveDate>,
}

pub fn run(args: SnoozeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut session = common::open_loaded_session(&config)?;
    let tz = session.timezone();

    let days = match (args.days, args.until) {
        (Some(days), _) => days,
        (None, Some(target)) => {
            scheduling::snooze_days_until(target, clock::today_in(tz, Utc::now()))
        }
        (None, None) => unreachable!("clap enforces one of --days/--until"),
    };

    let due = session.snooze(&args.task_id, days)?;
    println!(
        "Snoozed '{}' for {days} day(s); now due {}",
        args.task_id,
        due.with_timezone(&tz).date_naive()
    );
    Ok(())
}
