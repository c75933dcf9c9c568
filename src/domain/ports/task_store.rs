use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Bucket, ETag, Plan, Task, TaskDetails};

/// CRUD over plans, buckets and tasks.
///
/// Mutations of existing entities take the [`ETag`] read with the entity. A
/// stale token must fail with
/// [`DomainError::ConcurrencyConflict`](crate::domain::errors::DomainError::ConcurrencyConflict).
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_plans(&self, group_id: &str) -> DomainResult<Vec<Plan>>;

    async fn create_plan(&self, group_id: &str, title: &str) -> DomainResult<Plan>;

    async fn list_buckets(&self, plan_id: &str) -> DomainResult<Vec<Bucket>>;

    async fn create_bucket(&self, plan_id: &str, name: &str) -> DomainResult<Bucket>;

    /// Tasks of a bucket in remote enumeration order.
    async fn list_tasks(&self, bucket_id: &str) -> DomainResult<Vec<Task>>;

    async fn create_task(&self, plan_id: &str, bucket_id: &str, title: &str) -> DomainResult<Task>;

    async fn delete_task(&self, task_id: &str, etag: &ETag) -> DomainResult<()>;

    async fn get_task_details(&self, task_id: &str) -> DomainResult<TaskDetails>;

    async fn update_task_description(
        &self,
        task_id: &str,
        etag: &ETag,
        description: &str,
    ) -> DomainResult<()>;
}
