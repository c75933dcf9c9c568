//! Cleanup outcome domain models
//!
//! A cleanup pass never fails because one task could not be removed. Every
//! attempted deletion is recorded as a `Result`, so callers and tests can see
//! exactly which tasks went and which were skipped, and why.

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// A task that was removed from the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedTask {
    pub group: String,
    pub plan: String,
    pub bucket: String,
    pub task_id: String,
    pub title: String,
    /// Creation time exactly as the store reported it.
    pub created_at: String,
}

/// Why an attempted deletion did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SkipReason {
    /// The task changed since it was read; its token is stale.
    Conflict,
    /// The task was already gone.
    NotFound,
    /// Any other store failure.
    Failed(String),
}

impl From<&DomainError> for SkipReason {
    fn from(err: &DomainError) -> Self {
        match err {
            DomainError::ConcurrencyConflict { .. } => Self::Conflict,
            DomainError::NotFound(_) => Self::NotFound,
            other => Self::Failed(other.to_string()),
        }
    }
}

/// A deletion candidate that was left in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTask {
    pub task: DeletedTask,
    pub reason: SkipReason,
}

/// Per-candidate result of a cleanup pass.
pub type DeletionAttempt = Result<DeletedTask, SkippedTask>;

/// Why a cleanup pass stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every candidate in scope was handled.
    Completed,
    /// The wall-clock budget ran out; resume on the next run.
    BudgetExhausted,
    /// The per-run deletion cap was reached; resume on the next run.
    CapReached,
    /// The target plan does not exist, so there was nothing to do.
    PlanNotFound,
    /// The pass is switched off by a non-positive budget.
    Disabled,
}

impl StopReason {
    /// Whether more work may remain for a later run.
    pub fn is_partial(self) -> bool {
        matches!(self, Self::BudgetExhausted | Self::CapReached)
    }
}

/// Everything a single reconciler run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupOutcome {
    /// One entry per attempted deletion, in the order attempted.
    pub attempts: Vec<DeletionAttempt>,
    /// Tasks looked at during enumeration.
    pub examined: usize,
    /// Tasks left out because they lacked a usable timestamp or token.
    pub ignored: usize,
    pub stop: StopReason,
}

impl CleanupOutcome {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
            examined: 0,
            ignored: 0,
            stop: StopReason::Completed,
        }
    }

    /// An outcome for a pass that did no work at all.
    pub fn stopped(stop: StopReason) -> Self {
        Self {
            stop,
            ..Self::new()
        }
    }

    pub fn deleted(&self) -> impl Iterator<Item = &DeletedTask> {
        self.attempts.iter().filter_map(|a| a.as_ref().ok())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SkippedTask> {
        self.attempts.iter().filter_map(|a| a.as_ref().err())
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }

    /// Ids of deleted tasks, in deletion order.
    pub fn deleted_ids(&self) -> Vec<&str> {
        self.deleted().map(|d| d.task_id.as_str()).collect()
    }
}

impl Default for CleanupOutcome {
    fn default() -> Self {
        Self::new()
    }
}

/// A group removed by the bulk purge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedGroup {
    pub group_id: String,
    pub group_name: String,
    /// Number of plans the group owned when it was scanned.
    pub plan_count: usize,
}

/// A plan-owning group whose deletion failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedGroup {
    pub group_id: String,
    pub group_name: String,
    pub error: String,
}

/// Result of a bulk group purge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPurgeOutcome {
    pub deleted: Vec<DeletedGroup>,
    pub failed: Vec<FailedGroup>,
    /// Groups left alone because they own no plans.
    pub untouched: usize,
}
