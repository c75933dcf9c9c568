//! Planner Janitor CLI entry point.

use clap::Parser;

use planner_janitor::cli::commands;
use planner_janitor::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::RunCleanupCycle => commands::cycle::execute(config, cli.json).await,
        Commands::DeleteAllPlanOwningGroups => commands::groups::execute(config, cli.json).await,
        Commands::CreateSummary(args) => commands::summary::execute(args, config, cli.json).await,
        Commands::Structure => commands::structure::execute(config, cli.json).await,
    };

    if let Err(err) = result {
        planner_janitor::cli::handle_error(err, cli.json);
    }
}
