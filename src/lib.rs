//! Planner Janitor - mailbox summary tasks and Microsoft Planner housekeeping
//!
//! On every run the janitor files a task summarising a mailbox into a
//! designated plan, removes older summary tasks from that plan, and can sweep
//! tasks older than the retention window. Cleanup is bounded by a deletion cap
//! and a wall-clock budget.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the store ports
//! - **Service Layer** (`services`): cleanup policies, the reconciler and the keepalive cycle
//! - **Adapters** (`adapters`): Microsoft Graph client, in-memory planner, clocks
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use planner_janitor::{ConfigLoader, GraphClient, KeepaliveCycle, SystemClock};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let graph = Arc::new(GraphClient::from_config(&config)?);
//!     let report = KeepaliveCycle::from_config(graph, Arc::new(SystemClock), &config)
//!         .run()
//!         .await?;
//!     println!("{}", report.summary.title());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::{GraphClient, InMemoryPlanner, ManualClock, SystemClock, TaskSeed, TokenProvider};
pub use domain::models::{
    AuthMode, CleanupOutcome, Config, DeletedTask, ETag, GroupPurgeOutcome, LoggingConfig,
    PlanContext, PlanTarget, ScanScope, SkipReason, SkippedTask, StopReason,
};
pub use domain::ports::{Clock, Directory, Mailbox, TaskStore};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    CleanupLimits, CycleReport, GroupPurger, KeepaliveCycle, PlannerInventory, Reconciler,
    StageOutcome, SummaryTaskCreator,
};
