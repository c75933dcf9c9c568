//! Microsoft Graph wire payloads.
//!
//! Only the fields this tool reads or writes are modelled. Everything is
//! converted into domain types at the adapter boundary.

use serde::{Deserialize, Serialize};

use crate::domain::models::{
    Bucket, ETag, Group, MailboxOverview, Message, Plan, Task, TaskDetails,
};

/// A page of an OData collection.
#[derive(Debug, Clone, Deserialize)]
pub struct ODataPage<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphGroup {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl From<GraphGroup> for Group {
    fn from(g: GraphGroup) -> Self {
        Self {
            id: g.id,
            display_name: g.display_name.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphUser {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPlan {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub container: Option<GraphPlanContainer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPlanContainer {
    #[serde(default)]
    pub container_id: Option<String>,
}

impl GraphPlan {
    /// `fallback_group` is used when the payload names no owner.
    pub fn into_plan(self, fallback_group: &str) -> Plan {
        let group_id = self
            .owner
            .or_else(|| self.container.and_then(|c| c.container_id))
            .unwrap_or_else(|| fallback_group.to_string());
        Plan {
            id: self.id,
            title: self.title.unwrap_or_default(),
            group_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphBucket {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
}

impl GraphBucket {
    pub fn into_bucket(self, fallback_plan: &str) -> Bucket {
        Bucket {
            id: self.id,
            name: self.name.unwrap_or_default(),
            plan_id: self.plan_id.unwrap_or_else(|| fallback_plan.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphTask {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_date_time: Option<String>,
    #[serde(rename = "@odata.etag", default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub bucket_id: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
}

impl From<GraphTask> for Task {
    fn from(t: GraphTask) -> Self {
        Self {
            id: t.id,
            title: t.title.unwrap_or_default(),
            created_at: t.created_date_time,
            etag: t.etag.filter(|e| !e.is_empty()).map(ETag::new),
            bucket_id: t.bucket_id,
            plan_id: t.plan_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphTaskDetails {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "@odata.etag", default)]
    pub etag: Option<String>,
}

impl From<GraphTaskDetails> for TaskDetails {
    fn from(d: GraphTaskDetails) -> Self {
        Self {
            task_id: d.id,
            description: d.description,
            etag: d.etag.filter(|e| !e.is_empty()).map(ETag::new),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMailFolder {
    #[serde(default)]
    pub total_item_count: u64,
    #[serde(default)]
    pub unread_item_count: u64,
}

impl From<GraphMailFolder> for MailboxOverview {
    fn from(f: GraphMailFolder) -> Self {
        Self {
            unread_count: f.unread_item_count,
            total_count: f.total_item_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMessage {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub from: Option<GraphRecipient>,
    #[serde(default)]
    pub received_date_time: Option<String>,
    #[serde(default)]
    pub is_read: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRecipient {
    #[serde(default)]
    pub email_address: Option<GraphEmailAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphEmailAddress {
    #[serde(default)]
    pub address: Option<String>,
}

impl From<GraphMessage> for Message {
    fn from(m: GraphMessage) -> Self {
        Self {
            subject: m.subject.unwrap_or_default(),
            from: m
                .from
                .and_then(|f| f.email_address)
                .and_then(|e| e.address)
                .unwrap_or_else(|| "unknown".to_string()),
            received_at: m.received_date_time,
            is_read: m.is_read.unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatePlanRequest<'a> {
    pub owner: &'a str,
    pub title: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketRequest<'a> {
    pub name: &'a str,
    pub plan_id: &'a str,
    pub order_hint: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest<'a> {
    pub plan_id: &'a str,
    pub bucket_id: &'a str,
    pub title: &'a str,
}

#[derive(Debug, Serialize)]
pub struct UpdateDetailsRequest<'a> {
    pub description: &'a str,
}

/// Successful response of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

/// Error response of the token and device-code endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_in: u64,
    #[serde(default)]
    pub interval: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}
