//! CLI command implementations.

pub mod cycle;
pub mod groups;
pub mod structure;
pub mod summary;

pub use crate::cli::types::CreateSummaryArgs;
