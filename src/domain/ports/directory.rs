use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Group;

/// Read access to organizational groups and users, plus group removal.
#[async_trait]
pub trait Directory: Send + Sync {
    /// List every group visible to the caller, in remote order.
    async fn list_groups(&self) -> DomainResult<Vec<Group>>;

    /// Delete a group and everything it owns.
    async fn delete_group(&self, group_id: &str) -> DomainResult<()>;

    /// Resolve a user principal name to a user id.
    ///
    /// Returns [`DomainError::UserNotFound`](crate::domain::errors::DomainError::UserNotFound)
    /// when no user matches.
    async fn get_user_id(&self, email: &str) -> DomainResult<String>;
}
