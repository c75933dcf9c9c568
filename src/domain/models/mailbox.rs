//! Mailbox snapshot types used to compose the summary task.

use serde::{Deserialize, Serialize};

/// Unread and total counts of a user's inbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxOverview {
    pub unread_count: u64,
    pub total_count: u64,
}

/// A recent inbox message, reduced to what the summary shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub subject: String,
    /// Sender address, `"unknown"` when the store did not report one.
    pub from: String,
    pub received_at: Option<String>,
    pub is_read: bool,
}

impl Message {
    /// One line of the summary task description.
    pub fn summary_line(&self) -> String {
        format!(
            " - {} | {} | {} | {}",
            if self.is_read { "read" } else { "unread" },
            self.received_at.as_deref().unwrap_or("-"),
            self.from,
            self.subject
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line() {
        let msg = Message {
            subject: "Quarterly report".to_string(),
            from: "boss@example.com".to_string(),
            received_at: Some("2024-11-02T08:00:00Z".to_string()),
            is_read: false,
        };
        assert_eq!(
            msg.summary_line(),
            " - unread | 2024-11-02T08:00:00Z | boss@example.com | Quarterly report"
        );
    }
}
