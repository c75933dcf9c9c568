//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces the core consumes:
//! - Directory: groups and users
//! - Mailbox: inbox snapshot for the summary task
//! - TaskStore: plans, buckets and tasks with optimistic concurrency
//! - Clock: monotonic and wall-clock time
//!
//! The Graph adapter implements the first three against Microsoft Graph; the
//! in-memory planner implements them for tests and local dry runs.

pub mod clock;
pub mod directory;
pub mod mailbox;
pub mod task_store;

pub use clock::Clock;
pub use directory::Directory;
pub use mailbox::Mailbox;
pub use task_store::TaskStore;
