use clap::Args;
use timeblock_core::Config;

use super::common;

#[derive(Args)]
pub struct MoveArgs {
    /// Task id (or a unique id prefix)
    pub task_id: String,
    /// Destination list, by id or exact title
    #[arg(long, required = true, value_name = "LIST")]
    pub to: String,
}

pub fn run(args: MoveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut session = common::open_loaded_session(&config)?;

    let lists = session.tasklists()?;
    let dest = lists
        .iter()
        .find(|l| l.id == args.to || l.title == args.to)
        .ok_or_else(|| format!("no task list with id or title '{}'", args.to))?
        .clone();

    let copy = session.move_task(&args.task_id, &dest.id)?;
    println!("Moved '{}' to '{}' (new id {})", args.task_id, dest.title, copy.id);
    Ok(())
}
