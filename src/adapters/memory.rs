//! In-memory planner for tests and local dry runs.
//!
//! Implements every port against process-local state. Entities keep insertion
//! order, every mutation bumps a version, and the version is what the issued
//! [`ETag`] encodes, so stale tokens are rejected just like the remote store
//! rejects them. Failures can be injected per task or group.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::SecondsFormat;
use tokio::sync::RwLock;

use crate::adapters::clock::SystemClock;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Bucket, ETag, Group, MailboxOverview, Message, Plan, Task, TaskDetails,
};
use crate::domain::ports::{Clock, Directory, Mailbox, TaskStore};

/// Seed data for a task inserted directly into the store.
#[derive(Debug, Clone)]
pub struct TaskSeed {
    id: Option<String>,
    title: String,
    created_at: Option<String>,
    with_etag: bool,
}

impl TaskSeed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            created_at: None,
            with_etag: true,
        }
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn created(mut self, raw: impl Into<String>) -> Self {
        self.created_at = Some(raw.into());
        self
    }

    /// The store will report this task without a concurrency token.
    #[must_use]
    pub fn without_etag(mut self) -> Self {
        self.with_etag = false;
        self
    }
}

#[derive(Debug, Clone)]
struct StoredTask {
    id: String,
    title: String,
    created_at: Option<String>,
    bucket_id: String,
    plan_id: String,
    version: u64,
    with_etag: bool,
    description: Option<String>,
    details_version: u64,
}

impl StoredTask {
    fn etag(&self) -> ETag {
        ETag::new(format!("W/\"{}:{}\"", self.id, self.version))
    }

    fn details_etag(&self) -> ETag {
        ETag::new(format!("W/\"{}:details:{}\"", self.id, self.details_version))
    }

    fn to_task(&self) -> Task {
        Task {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at.clone(),
            etag: self.with_etag.then(|| self.etag()),
            bucket_id: Some(self.bucket_id.clone()),
            plan_id: Some(self.plan_id.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    groups: Vec<Group>,
    plans: Vec<Plan>,
    buckets: Vec<Bucket>,
    tasks: Vec<StoredTask>,
    users: HashMap<String, String>,
    mailboxes: HashMap<String, (MailboxOverview, Vec<Message>)>,
    failing_task_deletes: HashSet<String>,
    failing_group_deletes: HashSet<String>,
    fail_detail_updates: bool,
    fail_detail_reads: bool,
    hide_detail_etags: bool,
    next_id: u64,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// Process-local implementation of [`Directory`], [`Mailbox`] and [`TaskStore`].
pub struct InMemoryPlanner {
    state: Arc<RwLock<State>>,
    clock: Arc<dyn Clock>,
    calls: AtomicUsize,
}

impl InMemoryPlanner {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Use `clock` to stamp the creation time of tasks created through the port.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            clock,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of port calls served so far. Seeding does not count.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn add_group(&self, display_name: &str) -> Group {
        let mut state = self.state.write().await;
        let group = Group {
            id: state.next_id("group"),
            display_name: display_name.to_string(),
        };
        state.groups.push(group.clone());
        group
    }

    pub async fn add_plan(&self, group: &Group, title: &str) -> Plan {
        let mut state = self.state.write().await;
        let plan = Plan {
            id: state.next_id("plan"),
            title: title.to_string(),
            group_id: group.id.clone(),
        };
        state.plans.push(plan.clone());
        plan
    }

    pub async fn add_bucket(&self, plan: &Plan, name: &str) -> Bucket {
        let mut state = self.state.write().await;
        let bucket = Bucket {
            id: state.next_id("bucket"),
            name: name.to_string(),
            plan_id: plan.id.clone(),
        };
        state.buckets.push(bucket.clone());
        bucket
    }

    pub async fn add_task(&self, bucket: &Bucket, seed: TaskSeed) -> Task {
        let mut state = self.state.write().await;
        let id = match seed.id {
            Some(id) => id,
            None => state.next_id("task"),
        };
        let stored = StoredTask {
            id,
            title: seed.title,
            created_at: seed.created_at,
            bucket_id: bucket.id.clone(),
            plan_id: bucket.plan_id.clone(),
            version: 1,
            with_etag: seed.with_etag,
            description: None,
            details_version: 1,
        };
        let task = stored.to_task();
        state.tasks.push(stored);
        task
    }

    pub async fn add_user(&self, email: &str, user_id: &str) {
        let mut state = self.state.write().await;
        state.users.insert(email.to_lowercase(), user_id.to_string());
    }

    pub async fn set_mailbox(&self, user_id: &str, overview: MailboxOverview, messages: Vec<Message>) {
        let mut state = self.state.write().await;
        state
            .mailboxes
            .insert(user_id.to_string(), (overview, messages));
    }

    /// Simulate an external writer: bump the task's version so tokens read
    /// earlier become stale.
    pub async fn touch_task(&self, task_id: &str) {
        let mut state = self.state.write().await;
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id == task_id) {
            task.version += 1;
        }
    }

    /// Make every deletion of `task_id` fail with a transport error.
    pub async fn fail_task_delete(&self, task_id: &str) {
        let mut state = self.state.write().await;
        state.failing_task_deletes.insert(task_id.to_string());
    }

    /// Make every deletion of `group_id` fail with a transport error.
    pub async fn fail_group_delete(&self, group_id: &str) {
        let mut state = self.state.write().await;
        state.failing_group_deletes.insert(group_id.to_string());
    }

    /// Make task description writes fail.
    pub async fn fail_detail_updates(&self) {
        self.state.write().await.fail_detail_updates = true;
    }

    /// Make every task details read fail with a transport error.
    pub async fn fail_detail_reads(&self) {
        self.state.write().await.fail_detail_reads = true;
    }

    /// Report task details without a concurrency token.
    pub async fn hide_detail_etags(&self) {
        self.state.write().await.hide_detail_etags = true;
    }

    /// Ids of all stored tasks, in insertion order.
    pub async fn task_ids(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.tasks.iter().map(|t| t.id.clone()).collect()
    }

    /// All tasks of a plan, in insertion order.
    pub async fn tasks_in_plan(&self, plan_id: &str) -> Vec<Task> {
        let state = self.state.read().await;
        state
            .tasks
            .iter()
            .filter(|t| t.plan_id == plan_id)
            .map(StoredTask::to_task)
            .collect()
    }

    pub async fn group_ids(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.groups.iter().map(|g| g.id.clone()).collect()
    }

    pub async fn task_description(&self, task_id: &str) -> Option<String> {
        let state = self.state.read().await;
        state
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .and_then(|t| t.description.clone())
    }
}

impl Default for InMemoryPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPlanner")
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Directory for InMemoryPlanner {
    async fn list_groups(&self) -> DomainResult<Vec<Group>> {
        self.record_call();
        Ok(self.state.read().await.groups.clone())
    }

    async fn delete_group(&self, group_id: &str) -> DomainResult<()> {
        self.record_call();
        let mut state = self.state.write().await;
        if state.failing_group_deletes.contains(group_id) {
            return Err(DomainError::Transport(format!(
                "injected failure deleting group {group_id}"
            )));
        }
        if !state.groups.iter().any(|g| g.id == group_id) {
            return Err(DomainError::NotFound(format!("group {group_id}")));
        }
        let plan_ids: HashSet<String> = state
            .plans
            .iter()
            .filter(|p| p.group_id == group_id)
            .map(|p| p.id.clone())
            .collect();
        state.groups.retain(|g| g.id != group_id);
        state.plans.retain(|p| !plan_ids.contains(&p.id));
        state.buckets.retain(|b| !plan_ids.contains(&b.plan_id));
        state.tasks.retain(|t| !plan_ids.contains(&t.plan_id));
        Ok(())
    }

    async fn get_user_id(&self, email: &str) -> DomainResult<String> {
        self.record_call();
        self.state
            .read()
            .await
            .users
            .get(&email.to_lowercase())
            .cloned()
            .ok_or_else(|| DomainError::UserNotFound(email.to_string()))
    }
}

#[async_trait]
impl Mailbox for InMemoryPlanner {
    async fn inbox_overview(&self, user_id: &str) -> DomainResult<MailboxOverview> {
        self.record_call();
        let state = self.state.read().await;
        Ok(state
            .mailboxes
            .get(user_id)
            .map(|(overview, _)| *overview)
            .unwrap_or_default())
    }

    async fn recent_messages(&self, user_id: &str, count: usize) -> DomainResult<Vec<Message>> {
        self.record_call();
        let state = self.state.read().await;
        Ok(state
            .mailboxes
            .get(user_id)
            .map(|(_, messages)| messages.iter().take(count).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl TaskStore for InMemoryPlanner {
    async fn list_plans(&self, group_id: &str) -> DomainResult<Vec<Plan>> {
        self.record_call();
        let state = self.state.read().await;
        Ok(state
            .plans
            .iter()
            .filter(|p| p.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn create_plan(&self, group_id: &str, title: &str) -> DomainResult<Plan> {
        self.record_call();
        let mut state = self.state.write().await;
        if !state.groups.iter().any(|g| g.id == group_id) {
            return Err(DomainError::NotFound(format!("group {group_id}")));
        }
        let plan = Plan {
            id: state.next_id("plan"),
            title: title.to_string(),
            group_id: group_id.to_string(),
        };
        state.plans.push(plan.clone());
        Ok(plan)
    }

    async fn list_buckets(&self, plan_id: &str) -> DomainResult<Vec<Bucket>> {
        self.record_call();
        let state = self.state.read().await;
        Ok(state
            .buckets
            .iter()
            .filter(|b| b.plan_id == plan_id)
            .cloned()
            .collect())
    }

    async fn create_bucket(&self, plan_id: &str, name: &str) -> DomainResult<Bucket> {
        self.record_call();
        let mut state = self.state.write().await;
        if !state.plans.iter().any(|p| p.id == plan_id) {
            return Err(DomainError::NotFound(format!("plan {plan_id}")));
        }
        let bucket = Bucket {
            id: state.next_id("bucket"),
            name: name.to_string(),
            plan_id: plan_id.to_string(),
        };
        state.buckets.push(bucket.clone());
        Ok(bucket)
    }

    async fn list_tasks(&self, bucket_id: &str) -> DomainResult<Vec<Task>> {
        self.record_call();
        let state = self.state.read().await;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.bucket_id == bucket_id)
            .map(StoredTask::to_task)
            .collect())
    }

    async fn create_task(&self, plan_id: &str, bucket_id: &str, title: &str) -> DomainResult<Task> {
        self.record_call();
        let created_at = self
            .clock
            .now_utc()
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut state = self.state.write().await;
        if !state
            .buckets
            .iter()
            .any(|b| b.id == bucket_id && b.plan_id == plan_id)
        {
            return Err(DomainError::NotFound(format!(
                "bucket {bucket_id} in plan {plan_id}"
            )));
        }
        let stored = StoredTask {
            id: state.next_id("task"),
            title: title.to_string(),
            created_at: Some(created_at),
            bucket_id: bucket_id.to_string(),
            plan_id: plan_id.to_string(),
            version: 1,
            with_etag: true,
            description: None,
            details_version: 1,
        };
        let task = stored.to_task();
        state.tasks.push(stored);
        Ok(task)
    }

    async fn delete_task(&self, task_id: &str, etag: &ETag) -> DomainResult<()> {
        self.record_call();
        let mut state = self.state.write().await;
        if state.failing_task_deletes.contains(task_id) {
            return Err(DomainError::Transport(format!(
                "injected failure deleting task {task_id}"
            )));
        }
        let index = state
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| DomainError::NotFound(format!("task {task_id}")))?;
        if state.tasks[index].etag() != *etag {
            return Err(DomainError::ConcurrencyConflict {
                entity: "task".to_string(),
                id: task_id.to_string(),
            });
        }
        state.tasks.remove(index);
        Ok(())
    }

    async fn get_task_details(&self, task_id: &str) -> DomainResult<TaskDetails> {
        self.record_call();
        let state = self.state.read().await;
        if state.fail_detail_reads {
            return Err(DomainError::Transport(format!(
                "injected failure reading details of {task_id}"
            )));
        }
        let task = state
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .ok_or_else(|| DomainError::NotFound(format!("task {task_id}")))?;
        Ok(TaskDetails {
            task_id: task.id.clone(),
            description: task.description.clone(),
            etag: (!state.hide_detail_etags).then(|| task.details_etag()),
        })
    }

    async fn update_task_description(
        &self,
        task_id: &str,
        etag: &ETag,
        description: &str,
    ) -> DomainResult<()> {
        self.record_call();
        let mut state = self.state.write().await;
        if state.fail_detail_updates {
            return Err(DomainError::Transport(format!(
                "injected failure updating details of {task_id}"
            )));
        }
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| DomainError::NotFound(format!("task {task_id}")))?;
        if task.details_etag() != *etag {
            return Err(DomainError::ConcurrencyConflict {
                entity: "task details".to_string(),
                id: task_id.to_string(),
            });
        }
        task.description = Some(description.to_string());
        task.details_version += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (InMemoryPlanner, Bucket) {
        let store = InMemoryPlanner::new();
        let group = store.add_group("All Company").await;
        let plan = store.add_plan(&group, "Mailbox check").await;
        let bucket = store.add_bucket(&plan, "To do").await;
        (store, bucket)
    }

    #[tokio::test]
    async fn test_delete_with_current_etag() {
        let (store, bucket) = seeded().await;
        let task = store
            .add_task(&bucket, TaskSeed::new("a").created("2024-11-01T00:00:00Z"))
            .await;
        let etag = task.etag.clone().unwrap();

        store.delete_task(&task.id, &etag).await.unwrap();
        assert!(store.task_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_with_stale_etag_conflicts() {
        let (store, bucket) = seeded().await;
        let task = store.add_task(&bucket, TaskSeed::new("a")).await;
        let stale = task.etag.clone().unwrap();
        store.touch_task(&task.id).await;

        let err = store.delete_task(&task.id, &stale).await.unwrap_err();
        assert!(matches!(err, DomainError::ConcurrencyConflict { .. }));
        assert_eq!(store.task_ids().await, vec![task.id]);
    }

    #[tokio::test]
    async fn test_delete_missing_task_is_not_found() {
        let (store, bucket) = seeded().await;
        let task = store.add_task(&bucket, TaskSeed::new("a")).await;
        let etag = task.etag.clone().unwrap();
        store.delete_task(&task.id, &etag).await.unwrap();

        let err = store.delete_task(&task.id, &etag).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_seeded_task_without_etag() {
        let (store, bucket) = seeded().await;
        store
            .add_task(&bucket, TaskSeed::new("a").id("no-token").without_etag())
            .await;
        let tasks = store.list_tasks(&bucket.id).await.unwrap();
        assert_eq!(tasks[0].id, "no-token");
        assert!(tasks[0].etag.is_none());
    }

    #[tokio::test]
    async fn test_delete_group_cascades() {
        let (store, bucket) = seeded().await;
        store.add_task(&bucket, TaskSeed::new("a")).await;
        let group_id = store.group_ids().await.remove(0);

        store.delete_group(&group_id).await.unwrap();
        assert!(store.group_ids().await.is_empty());
        assert!(store.task_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_details_update_requires_details_etag() {
        let (store, bucket) = seeded().await;
        let task = store.add_task(&bucket, TaskSeed::new("a")).await;
        let details = store.get_task_details(&task.id).await.unwrap();
        let etag = details.etag.unwrap();

        store
            .update_task_description(&task.id, &etag, "hello")
            .await
            .unwrap();
        assert_eq!(store.task_description(&task.id).await.as_deref(), Some("hello"));

        let err = store
            .update_task_description(&task.id, &etag, "again")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ConcurrencyConflict { .. }));
    }

    #[tokio::test]
    async fn test_call_count_excludes_seeding() {
        let (store, bucket) = seeded().await;
        assert_eq!(store.call_count(), 0);
        store.list_tasks(&bucket.id).await.unwrap();
        assert_eq!(store.call_count(), 1);
    }
}
