//! Classification policies used by the reconciler.
//!
//! Both policies work on [`Candidate`]s: tasks that carry a parseable creation
//! time and a concurrency token. Tasks missing either never become candidates,
//! so neither policy can select them.

use chrono::{DateTime, Duration, Utc};

use crate::domain::models::{DeletedTask, ETag, Task};

/// Retention window of the age-based pass, in days.
pub const RETENTION_DAYS: i64 = 7;

/// The fixed retention window.
pub fn retention_window() -> Duration {
    Duration::days(RETENTION_DAYS)
}

/// Names of the containers a task was found in, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub group: String,
    pub plan: String,
    pub bucket: String,
}

/// A task that can be safely classified and deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub task_id: String,
    pub title: String,
    pub created_raw: String,
    pub created: DateTime<Utc>,
    pub etag: ETag,
    pub location: Location,
}

impl Candidate {
    /// `None` when the task lacks a token, a timestamp, or the timestamp does
    /// not parse.
    pub fn classify(task: &Task, location: &Location) -> Option<Self> {
        let etag = task.etag.clone()?;
        let created_raw = task.created_at.clone()?;
        let created = task.created_time()?;
        Some(Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            created_raw,
            created,
            etag,
            location: location.clone(),
        })
    }

    /// The report entry for this candidate.
    pub fn record(&self) -> DeletedTask {
        DeletedTask {
            group: self.location.group.clone(),
            plan: self.location.plan.clone(),
            bucket: self.location.bucket.clone(),
            task_id: self.task_id.clone(),
            title: self.title.clone(),
            created_at: self.created_raw.clone(),
        }
    }
}

/// Age policy: a task is expired once it is at least `retention` old.
pub fn is_expired(created: DateTime<Utc>, now: DateTime<Utc>, retention: Duration) -> bool {
    now - created >= retention
}

/// Keep-latest policy: rank newest first and return everything past the
/// first `keep`, in ranked order.
///
/// The sort is stable, so tasks with identical timestamps keep the order in
/// which they were enumerated and the first one seen ranks higher.
pub fn beyond_latest(mut candidates: Vec<Candidate>, keep: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.created.cmp(&a.created));
    if keep >= candidates.len() {
        return Vec::new();
    }
    candidates.split_off(keep)
}
