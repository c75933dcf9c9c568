//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use planner_janitor::domain::models::{Bucket, MailboxOverview, Message};
use planner_janitor::services::budget::TimeBudget;
use planner_janitor::{CleanupLimits, Clock, InMemoryPlanner, ManualClock, Reconciler};

pub const USER_EMAIL: &str = "ops@contoso.example";
pub const USER_ID: &str = "user-1";
pub const PLAN_TITLE: &str = "Mailbox check";

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A store holding one group, one plan titled [`PLAN_TITLE`] and one bucket.
pub struct Fixture {
    pub store: Arc<InMemoryPlanner>,
    pub clock: Arc<ManualClock>,
    pub bucket: Bucket,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_clock(ManualClock::default()).await
    }

    pub async fn with_clock(clock: ManualClock) -> Self {
        let clock = Arc::new(clock);
        let store = Arc::new(InMemoryPlanner::with_clock(clock.clone()));
        let group = store.add_group("All Company").await;
        let plan = store.add_plan(&group, PLAN_TITLE).await;
        let bucket = store.add_bucket(&plan, "To do").await;
        Self {
            store,
            clock,
            bucket,
        }
    }

    pub fn reconciler(&self, max_deletes: usize, budget_secs: f64) -> Reconciler<InMemoryPlanner> {
        Reconciler::new(
            self.store.clone(),
            self.clock.clone(),
            CleanupLimits::new(max_deletes, TimeBudget::from_secs(budget_secs)),
        )
    }

    /// Register the configured user with an inbox.
    pub async fn with_mailbox(self, unread: u64, total: u64, messages: Vec<Message>) -> Self {
        self.store.add_user(USER_EMAIL, USER_ID).await;
        self.store
            .set_mailbox(
                USER_ID,
                MailboxOverview {
                    unread_count: unread,
                    total_count: total,
                },
                messages,
            )
            .await;
        self
    }

    /// `now` of the fixture clock shifted back by `age`, as the store reports it.
    pub fn aged(&self, age: Duration) -> String {
        timestamp(self.clock.now_utc() - age)
    }
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn message(subject: &str, from: &str, is_read: bool) -> Message {
    Message {
        subject: subject.to_string(),
        from: from.to_string(),
        received_at: Some("2024-11-10T08:00:00Z".to_string()),
        is_read,
    }
}
