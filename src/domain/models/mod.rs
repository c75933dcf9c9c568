//! Domain models for the planner janitor.

pub mod cleanup;
pub mod config;
pub mod mailbox;
pub mod planner;

pub use cleanup::{
    CleanupOutcome, DeletedGroup, DeletedTask, DeletionAttempt, FailedGroup, GroupPurgeOutcome,
    SkipReason, SkippedTask, StopReason,
};
pub use config::{
    AuthConfig, AuthMode, CleanupConfig, Config, GraphConfig, LoggingConfig, MailboxConfig,
    PlannerConfig,
};
pub use mailbox::{MailboxOverview, Message};
pub use planner::{
    parse_timestamp, Bucket, ETag, Group, Plan, PlanContext, PlanTarget, ScanScope, Task,
    TaskDetails,
};
