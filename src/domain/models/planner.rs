//! Planner entities: groups, plans, buckets and tasks.
//!
//! These are the shapes the core works with. The Graph adapter maps its wire
//! payloads into them; nothing here knows about HTTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// Optimistic-concurrency token for a remote entity.
///
/// There is no public constructor. A value is obtained only by reading an
/// entity from a store, and every mutating store call takes `&ETag`, so a
/// mutation that was not preceded by a read does not compile. Tokens are
/// serialized for reports but never deserialized:
///
/// ```compile_fail
/// let forged: planner_janitor::ETag = serde_json::from_str(r#""W/\"x\"""#).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
    pub(crate) fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw token, as sent in an `If-Match` header.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An organizational group that can own plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub display_name: String,
}

/// A plan owned by a group. The title is the only key this system cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub title: String,
    pub group_id: String,
}

/// A sub-container of tasks within a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    pub plan_id: String,
}

/// A planner task as enumerated from a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    /// Creation time exactly as the store reported it.
    pub created_at: Option<String>,
    pub etag: Option<ETag>,
    pub bucket_id: Option<String>,
    pub plan_id: Option<String>,
}

impl Task {
    /// Parsed creation time, or `None` when absent or malformed.
    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .as_deref()
            .and_then(|raw| parse_timestamp(raw).ok())
    }
}

/// The detail record of a task, carrying its own concurrency token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDetails {
    pub task_id: String,
    pub description: Option<String>,
    pub etag: Option<ETag>,
}

/// Identifies a plan that has already been located, so later passes can skip
/// the title lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanContext {
    pub group_id: String,
    pub group_name: String,
    pub plan_id: String,
    pub plan_title: String,
}

impl PlanContext {
    pub fn from_parts(group: &Group, plan: &Plan) -> Self {
        Self {
            group_id: group.id.clone(),
            group_name: group.display_name.clone(),
            plan_id: plan.id.clone(),
            plan_title: plan.title.clone(),
        }
    }
}

/// How a single target plan is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanTarget {
    /// Already located; no lookup needed.
    Known(PlanContext),
    /// Resolved by exact title; the first group containing it wins.
    Title(String),
}

/// What a cleanup pass walks over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanScope {
    Plan(PlanTarget),
    /// Every plan of every group.
    AllPlans,
}

/// Parse an ISO-8601 / RFC 3339 timestamp into UTC.
pub fn parse_timestamp(raw: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::InvalidTimestamp {
            value: raw.to_string(),
            reason: e.to_string(),
        })
}
