//! Microsoft Graph HTTP client.
//!
//! Implements the [`Directory`], [`Mailbox`] and [`TaskStore`] ports over the
//! Graph v1.0 REST API. Every mutation of a planner entity carries the
//! entity's `If-Match` token. Collections are followed across
//! `@odata.nextLink` pages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::auth::TokenProvider;
use super::errors::GraphError;
use super::models::{
    CreateBucketRequest, CreatePlanRequest, CreateTaskRequest, GraphBucket, GraphGroup,
    GraphMailFolder, GraphMessage, GraphPlan, GraphTask, GraphTaskDetails, GraphUser, ODataPage,
    UpdateDetailsRequest,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Bucket, Config, ETag, Group, MailboxOverview, Message, Plan, Task, TaskDetails,
};
use crate::domain::ports::{Directory, Mailbox, TaskStore};

/// Order hint Graph accepts for "place anywhere".
const DEFAULT_ORDER_HINT: &str = " !";

/// Used when the configured timeout is not a usable duration.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for Microsoft Graph.
#[derive(Debug)]
pub struct GraphClient {
    http: Client,
    base_url: String,
    tokens: TokenProvider,
}

impl GraphClient {
    /// Build a client and its token provider from configuration.
    pub fn from_config(config: &Config) -> Result<Self, GraphError> {
        let timeout = Duration::try_from_secs_f64(config.graph.request_timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        let http = Client::builder().timeout(timeout).build()?;
        let tokens = TokenProvider::from_config(&config.auth, http.clone())?;
        Ok(Self::new(http, &config.graph.base_url, tokens))
    }

    pub fn new(http: Client, base_url: &str, tokens: TokenProvider) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, GraphError> {
        let token = self.tokens.access_token().await?;
        Ok(self
            .http
            .request(method, self.url(path))
            .bearer_auth(token))
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Response, GraphError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(path, status = status.as_u16(), "graph response");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GraphError::from_status(status, path, &body))
    }

    async fn json<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, GraphError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GraphError::InvalidResponse {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GraphError> {
        let request = self.request(Method::GET, path).await?.query(query);
        let response = self.send(path, request).await?;
        Self::json(path, response).await
    }

    /// Every item of a collection, following `@odata.nextLink`.
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, GraphError> {
        let mut items = Vec::new();
        let mut page: ODataPage<T> = self.get(path, &[]).await?;
        loop {
            items.append(&mut page.value);
            match page.next_link.take() {
                Some(next) => page = self.get(&next, &[]).await?,
                None => return Ok(items),
            }
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GraphError> {
        let request = self.request(Method::POST, path).await?.json(body);
        let response = self.send(path, request).await?;
        Self::json(path, response).await
    }

    async fn delete(&self, path: &str, etag: Option<&ETag>) -> Result<(), GraphError> {
        let mut request = self.request(Method::DELETE, path).await?;
        if let Some(etag) = etag {
            request = request.header("If-Match", etag.as_str());
        }
        self.send(path, request).await?;
        Ok(())
    }

    async fn patch<B: Serialize>(&self, path: &str, etag: &ETag, body: &B) -> Result<(), GraphError> {
        let request = self
            .request(Method::PATCH, path)
            .await?
            .header("If-Match", etag.as_str())
            .json(body);
        self.send(path, request).await?;
        Ok(())
    }
}

/// Quote a value for an OData string literal.
fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[async_trait]
impl Directory for GraphClient {
    async fn list_groups(&self) -> DomainResult<Vec<Group>> {
        let groups: Vec<GraphGroup> = self.get_all("groups").await?;
        Ok(groups.into_iter().map(Group::from).collect())
    }

    async fn delete_group(&self, group_id: &str) -> DomainResult<()> {
        self.delete(&format!("groups/{group_id}"), None)
            .await
            .map_err(|e| e.into_domain("group", group_id))
    }

    async fn get_user_id(&self, email: &str) -> DomainResult<String> {
        let filter = format!("userPrincipalName eq {}", odata_literal(email));
        let page: ODataPage<GraphUser> = self.get("users", &[("$filter", filter)]).await?;
        page.value
            .into_iter()
            .next()
            .map(|u| u.id)
            .ok_or_else(|| DomainError::UserNotFound(email.to_string()))
    }
}

#[async_trait]
impl Mailbox for GraphClient {
    async fn inbox_overview(&self, user_id: &str) -> DomainResult<MailboxOverview> {
        let folder: GraphMailFolder = self
            .get(
                &format!("users/{user_id}/mailFolders/Inbox"),
                &[(
                    "$select",
                    "displayName,totalItemCount,unreadItemCount".to_string(),
                )],
            )
            .await?;
        Ok(folder.into())
    }

    async fn recent_messages(&self, user_id: &str, count: usize) -> DomainResult<Vec<Message>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let page: ODataPage<GraphMessage> = self
            .get(
                &format!("users/{user_id}/mailFolders/Inbox/messages"),
                &[
                    ("$top", count.to_string()),
                    ("$orderby", "receivedDateTime desc".to_string()),
                    ("$select", "subject,from,isRead,receivedDateTime".to_string()),
                ],
            )
            .await?;
        Ok(page.value.into_iter().map(Message::from).collect())
    }
}

#[async_trait]
impl TaskStore for GraphClient {
    async fn list_plans(&self, group_id: &str) -> DomainResult<Vec<Plan>> {
        let plans: Vec<GraphPlan> = self
            .get_all(&format!("groups/{group_id}/planner/plans"))
            .await?;
        Ok(plans.into_iter().map(|p| p.into_plan(group_id)).collect())
    }

    async fn create_plan(&self, group_id: &str, title: &str) -> DomainResult<Plan> {
        let body = CreatePlanRequest {
            owner: group_id,
            title,
        };
        let plan: GraphPlan = self.post("planner/plans", &body).await?;
        Ok(plan.into_plan(group_id))
    }

    async fn list_buckets(&self, plan_id: &str) -> DomainResult<Vec<Bucket>> {
        let buckets: Vec<GraphBucket> = self
            .get_all(&format!("planner/plans/{plan_id}/buckets"))
            .await?;
        Ok(buckets.into_iter().map(|b| b.into_bucket(plan_id)).collect())
    }

    async fn create_bucket(&self, plan_id: &str, name: &str) -> DomainResult<Bucket> {
        let body = CreateBucketRequest {
            name,
            plan_id,
            order_hint: DEFAULT_ORDER_HINT,
        };
        let bucket: GraphBucket = self.post("planner/buckets", &body).await?;
        Ok(bucket.into_bucket(plan_id))
    }

    async fn list_tasks(&self, bucket_id: &str) -> DomainResult<Vec<Task>> {
        let tasks: Vec<GraphTask> = self
            .get_all(&format!("planner/buckets/{bucket_id}/tasks"))
            .await?;
        Ok(tasks.into_iter().map(Task::from).collect())
    }

    async fn create_task(&self, plan_id: &str, bucket_id: &str, title: &str) -> DomainResult<Task> {
        let body = CreateTaskRequest {
            plan_id,
            bucket_id,
            title,
        };
        let task: GraphTask = self.post("planner/tasks", &body).await?;
        Ok(task.into())
    }

    async fn delete_task(&self, task_id: &str, etag: &ETag) -> DomainResult<()> {
        self.delete(&format!("planner/tasks/{task_id}"), Some(etag))
            .await
            .map_err(|e| e.into_domain("task", task_id))
    }

    async fn get_task_details(&self, task_id: &str) -> DomainResult<TaskDetails> {
        let details: GraphTaskDetails = self
            .get(&format!("planner/tasks/{task_id}/details"), &[])
            .await?;
        Ok(details.into())
    }

    async fn update_task_description(
        &self,
        task_id: &str,
        etag: &ETag,
        description: &str,
    ) -> DomainResult<()> {
        self.patch(
            &format!("planner/tasks/{task_id}/details"),
            etag,
            &UpdateDetailsRequest { description },
        )
        .await
        .map_err(|e| e.into_domain("task details", task_id))
    }
}
