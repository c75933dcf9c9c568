//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "planner-janitor")]
#[command(about = "Planner Janitor - keeps a mailbox summary plan fresh and tidy", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to planner-janitor.yaml in the working directory)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// File a mailbox summary task, then prune older summaries and expired tasks
    #[command(alias = "keepalive")]
    RunCleanupCycle,

    /// Delete every group that owns at least one plan
    #[command(alias = "delete-groups")]
    DeleteAllPlanOwningGroups,

    /// File a mailbox summary task without any cleanup
    CreateSummary(CreateSummaryArgs),

    /// Print groups, plans and buckets
    Structure,
}

#[derive(Args, Debug, Default)]
pub struct CreateSummaryArgs {
    /// Plan to file the task in (defaults to planner.plan_title)
    #[arg(short, long)]
    pub plan: Option<String>,

    /// Number of recent messages to include (defaults to mailbox.recent_count)
    #[arg(short, long)]
    pub recent: Option<usize>,
}
