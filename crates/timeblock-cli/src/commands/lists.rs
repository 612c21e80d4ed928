use clap::Args;
use timeblock_core::Config;

use super::common;

#[derive(Args)]
pub struct ListsArgs {
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ListsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let session = common::open_session(&config)?;
    session.connect()?;

    let lists = session.tasklists()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&lists)?);
        return Ok(());
    }
    for list in &lists {
        println!("{}  {}", list.id, list.title);
    }
    Ok(())
}
