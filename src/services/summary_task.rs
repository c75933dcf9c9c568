//! Creates the mailbox summary task that keeps the tenant active.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Bucket, Config, Group, MailboxOverview, Message, PlanContext, Task,
};
use crate::domain::ports::{Clock, Directory, Mailbox, TaskStore};
use crate::services::lookup::find_plan;

/// Subject characters shown in a summary title.
pub const SUBJECT_PREVIEW_CHARS: usize = 30;

const NO_RECENT_MAIL: &str = "(no recent mail)";

/// Settings the creator needs, lifted out of [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarySettings {
    pub user_email: String,
    /// Title prefix; the plan title is used when unset or empty.
    pub title_prefix: Option<String>,
    /// Display name of the group a missing plan is created under.
    pub plan_group: Option<String>,
    pub default_bucket_name: String,
}

impl From<&Config> for SummarySettings {
    fn from(config: &Config) -> Self {
        Self {
            user_email: config.mailbox.user_email.clone(),
            title_prefix: config.planner.task_title_prefix.clone(),
            plan_group: config.planner.plan_group.clone(),
            default_bucket_name: config.planner.default_bucket_name.clone(),
        }
    }
}

/// A created summary task and what it reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryTask {
    pub task: Task,
    pub context: PlanContext,
    pub bucket: Bucket,
    pub overview: MailboxOverview,
    pub recent: Vec<Message>,
    pub notes_written: bool,
    pub notes_error: Option<String>,
}

impl SummaryTask {
    /// Where the task lives, for later passes over the same plan.
    pub fn plan_context(&self) -> &PlanContext {
        &self.context
    }

    pub fn title(&self) -> &str {
        &self.task.title
    }
}

/// First `max` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// `"{prefix}-{YYYY-MM-DD HH:MM:SS UTC} unread:{u} total:{t} latest:{subject}"`
pub fn compose_title(
    prefix: &str,
    now: DateTime<Utc>,
    overview: MailboxOverview,
    latest: Option<&Message>,
) -> String {
    let subject = latest.map_or(NO_RECENT_MAIL, |m| m.subject.as_str());
    format!(
        "{prefix}-{} unread:{} total:{} latest:{}",
        now.format("%Y-%m-%d %H:%M:%S UTC"),
        overview.unread_count,
        overview.total_count,
        truncate_chars(subject, SUBJECT_PREVIEW_CHARS)
    )
}

/// Multi-line task notes: counts, location, then one line per message.
pub fn compose_description(summary: &SummaryTask) -> String {
    let mut lines = vec![
        format!(
            "Unread: {} / Total: {}",
            summary.overview.unread_count, summary.overview.total_count
        ),
        format!(
            "Location: group {} / plan {} / bucket {}",
            summary.context.group_name, summary.context.plan_title, summary.bucket.name
        ),
        "Recent mail:".to_string(),
    ];
    lines.extend(summary.recent.iter().map(Message::summary_line));
    lines.join("\n")
}

/// Builds summary tasks from a mailbox snapshot.
pub struct SummaryTaskCreator<S: ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    settings: SummarySettings,
}

impl<S> SummaryTaskCreator<S>
where
    S: Directory + Mailbox + TaskStore + ?Sized,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, settings: SummarySettings) -> Self {
        Self {
            store,
            clock,
            settings,
        }
    }

    /// Snapshot the configured mailbox and file a summary task in `plan_title`,
    /// creating the plan and a bucket if needed.
    #[instrument(skip(self))]
    pub async fn create(&self, plan_title: &str, recent_count: usize) -> DomainResult<SummaryTask> {
        let user_id = self.store.get_user_id(&self.settings.user_email).await?;
        let overview = self.store.inbox_overview(&user_id).await?;
        let recent = self.store.recent_messages(&user_id, recent_count).await?;

        let prefix = self
            .settings
            .title_prefix
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(plan_title);
        let title = compose_title(prefix, self.clock.now_utc(), overview, recent.first());

        let (context, bucket) = self.ensure_plan_and_bucket(plan_title).await?;
        let task = self
            .store
            .create_task(&context.plan_id, &bucket.id, &title)
            .await?;
        info!(
            task_id = %task.id,
            group = %context.group_name,
            plan = %context.plan_title,
            bucket = %bucket.name,
            unread = overview.unread_count,
            total = overview.total_count,
            "summary task created"
        );

        Ok(SummaryTask {
            task,
            context,
            bucket,
            overview,
            recent,
            notes_written: false,
            notes_error: None,
        })
    }

    /// [`create`](Self::create), then write the snapshot into the task notes.
    ///
    /// A failed or impossible notes write is reported on the result, never
    /// returned as an error.
    pub async fn create_with_notes(
        &self,
        plan_title: &str,
        recent_count: usize,
    ) -> DomainResult<SummaryTask> {
        let mut summary = self.create(plan_title, recent_count).await?;
        let details = match self.store.get_task_details(&summary.task.id).await {
            Ok(details) => details,
            Err(err) => {
                warn!(task_id = %summary.task.id, error = %err, "failed to read task details");
                summary.notes_error = Some(err.to_string());
                return Ok(summary);
            }
        };

        let Some(etag) = details.etag else {
            warn!(task_id = %summary.task.id, "task details carry no etag, notes not written");
            return Ok(summary);
        };

        let description = compose_description(&summary);
        match self
            .store
            .update_task_description(&summary.task.id, &etag, &description)
            .await
        {
            Ok(()) => summary.notes_written = true,
            Err(err) => {
                warn!(task_id = %summary.task.id, error = %err, "failed to write task notes");
                summary.notes_error = Some(err.to_string());
            }
        }
        Ok(summary)
    }

    /// Locate `plan_title`, or create it under the placement group, and
    /// return its first bucket, creating one when the plan has none.
    pub async fn ensure_plan_and_bucket(&self, plan_title: &str) -> DomainResult<(PlanContext, Bucket)> {
        let context = match find_plan(&*self.store, plan_title).await? {
            Some((group, plan)) => PlanContext::from_parts(&group, &plan),
            None => {
                let group = self.placement_group(plan_title).await?;
                let plan = self.store.create_plan(&group.id, plan_title).await?;
                info!(group = %group.display_name, plan_id = %plan.id, "plan created");
                PlanContext::from_parts(&group, &plan)
            }
        };

        let bucket = match self.store.list_buckets(&context.plan_id).await?.into_iter().next() {
            Some(bucket) => bucket,
            None => {
                let bucket = self
                    .store
                    .create_bucket(&context.plan_id, &self.settings.default_bucket_name)
                    .await?;
                info!(bucket = %bucket.name, "bucket created");
                bucket
            }
        };
        Ok((context, bucket))
    }

    async fn placement_group(&self, plan_title: &str) -> DomainResult<Group> {
        let groups = self.store.list_groups().await?;
        let chosen = match &self.settings.plan_group {
            Some(name) => groups.into_iter().find(|g| &g.display_name == name),
            None => groups.into_iter().next(),
        };
        chosen.ok_or_else(|| DomainError::NoGroupAvailable(plan_title.to_string()))
    }
}

impl<S: ?Sized> std::fmt::Debug for SummaryTaskCreator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryTaskCreator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use crate::adapters::memory::InMemoryPlanner;

    const EMAIL: &str = "ops@contoso.example";

    fn settings() -> SummarySettings {
        SummarySettings {
            user_email: EMAIL.to_string(),
            title_prefix: None,
            plan_group: None,
            default_bucket_name: "To do".to_string(),
        }
    }

    fn message(subject: &str) -> Message {
        Message {
            subject: subject.to_string(),
            from: "boss@contoso.example".to_string(),
            received_at: Some("2024-11-10T11:00:00Z".to_string()),
            is_read: false,
        }
    }

    async fn store_with_mail(messages: Vec<Message>) -> Arc<InMemoryPlanner> {
        let store = Arc::new(InMemoryPlanner::new());
        store.add_user(EMAIL, "user-1").await;
        store
            .set_mailbox(
                "user-1",
                MailboxOverview {
                    unread_count: 3,
                    total_count: 42,
                },
                messages,
            )
            .await;
        store
    }

    fn creator(store: &Arc<InMemoryPlanner>, settings: SummarySettings) -> SummaryTaskCreator<InMemoryPlanner> {
        SummaryTaskCreator::new(store.clone(), Arc::new(ManualClock::default()), settings)
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("hello", 30), "hello");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("日本語のメール件名", 3), "日本語");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_compose_title_format() {
        let now = ManualClock::default().now_utc();
        let overview = MailboxOverview {
            unread_count: 2,
            total_count: 9,
        };
        let title = compose_title("Mailbox check", now, overview, Some(&message("Hi")));
        assert_eq!(
            title,
            "Mailbox check-2024-11-10 12:00:00 UTC unread:2 total:9 latest:Hi"
        );
        let empty = compose_title("Mailbox check", now, overview, None);
        assert!(empty.ends_with("latest:(no recent mail)"));
    }

    #[tokio::test]
    async fn test_creates_plan_and_bucket_when_missing() {
        let store = store_with_mail(vec![message("Quarterly numbers")]).await;
        store.add_group("All Company").await;

        let summary = creator(&store, settings())
            .create("Mailbox check", 5)
            .await
            .unwrap();

        assert_eq!(summary.context.plan_title, "Mailbox check");
        assert_eq!(summary.context.group_name, "All Company");
        assert_eq!(summary.bucket.name, "To do");
        assert!(summary.title().starts_with("Mailbox check-2024-11-10 12:00:00 UTC"));
        assert!(summary.title().ends_with("latest:Quarterly numbers"));
        assert_eq!(store.tasks_in_plan(&summary.context.plan_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_reuses_existing_plan_and_first_bucket() {
        let store = store_with_mail(vec![]).await;
        let group = store.add_group("Team").await;
        let plan = store.add_plan(&group, "Mailbox check").await;
        let first = store.add_bucket(&plan, "Inbox").await;
        store.add_bucket(&plan, "Archive").await;

        let summary = creator(&store, settings())
            .create("Mailbox check", 5)
            .await
            .unwrap();
        assert_eq!(summary.context.plan_id, plan.id);
        assert_eq!(summary.bucket.id, first.id);
    }

    #[tokio::test]
    async fn test_configured_prefix_and_placement_group() {
        let store = store_with_mail(vec![]).await;
        store.add_group("First").await;
        store.add_group("Ops").await;

        let settings = SummarySettings {
            title_prefix: Some("keepalive".to_string()),
            plan_group: Some("Ops".to_string()),
            ..settings()
        };
        let summary = creator(&store, settings)
            .create("Mailbox check", 5)
            .await
            .unwrap();
        assert_eq!(summary.context.group_name, "Ops");
        assert!(summary.title().starts_with("keepalive-"));
    }

    #[tokio::test]
    async fn test_no_group_available() {
        let store = store_with_mail(vec![]).await;
        let err = creator(&store, settings())
            .create("Mailbox check", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NoGroupAvailable(_)));
    }

    #[tokio::test]
    async fn test_unknown_user_is_fatal() {
        let store = Arc::new(InMemoryPlanner::new());
        store.add_group("All Company").await;
        let err = creator(&store, settings())
            .create("Mailbox check", 5)
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_notes_written() {
        let store = store_with_mail(vec![message("Hello"), message("Second")]).await;
        store.add_group("All Company").await;

        let summary = creator(&store, settings())
            .create_with_notes("Mailbox check", 5)
            .await
            .unwrap();
        assert!(summary.notes_written);
        let notes = store.task_description(&summary.task.id).await.unwrap();
        let lines: Vec<_> = notes.lines().collect();
        assert_eq!(lines[0], "Unread: 3 / Total: 42");
        assert_eq!(lines[1], "Location: group All Company / plan Mailbox check / bucket To do");
        assert_eq!(lines[2], "Recent mail:");
        assert_eq!(lines.len(), 5);
    }

    #[tokio::test]
    async fn test_notes_failure_is_not_fatal() {
        let store = store_with_mail(vec![]).await;
        store.add_group("All Company").await;
        store.fail_detail_updates().await;

        let summary = creator(&store, settings())
            .create_with_notes("Mailbox check", 5)
            .await
            .unwrap();
        assert!(!summary.notes_written);
        assert!(summary.notes_error.is_some());
    }

    #[tokio::test]
    async fn test_notes_skipped_without_etag() {
        let store = store_with_mail(vec![]).await;
        store.add_group("All Company").await;
        store.hide_detail_etags().await;

        let summary = creator(&store, settings())
            .create_with_notes("Mailbox check", 5)
            .await
            .unwrap();
        assert!(!summary.notes_written);
        assert!(summary.notes_error.is_none());
    }
}
