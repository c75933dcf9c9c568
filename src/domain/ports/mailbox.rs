use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{MailboxOverview, Message};

/// Read-only view of a user's inbox.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Unread and total message counts of the inbox.
    async fn inbox_overview(&self, user_id: &str) -> DomainResult<MailboxOverview>;

    /// The `count` most recently received inbox messages, newest first.
    async fn recent_messages(&self, user_id: &str, count: usize) -> DomainResult<Vec<Message>>;
}
