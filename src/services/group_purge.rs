//! Bulk removal of every group that owns at least one plan.
//!
//! Deleting a group takes its plans, buckets and tasks with it. Groups that own
//! no plan are left alone.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{DeletedGroup, FailedGroup, GroupPurgeOutcome};
use crate::domain::ports::{Directory, TaskStore};

pub struct GroupPurger<S: ?Sized> {
    store: Arc<S>,
}

impl<S> GroupPurger<S>
where
    S: Directory + TaskStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Delete every plan-owning group. A failed deletion is recorded and the
    /// loop moves on; only enumeration failures are returned as errors.
    pub async fn purge(&self) -> DomainResult<GroupPurgeOutcome> {
        let mut outcome = GroupPurgeOutcome::default();

        for group in self.store.list_groups().await? {
            let plan_count = self.store.list_plans(&group.id).await?.len();
            if plan_count == 0 {
                outcome.untouched += 1;
                continue;
            }

            match self.store.delete_group(&group.id).await {
                Ok(()) => {
                    info!(group = %group.display_name, plan_count, "group deleted");
                    outcome.deleted.push(DeletedGroup {
                        group_id: group.id,
                        group_name: group.display_name,
                        plan_count,
                    });
                }
                Err(err) => {
                    warn!(group = %group.display_name, error = %err, "failed to delete group");
                    outcome.failed.push(FailedGroup {
                        group_id: group.id,
                        group_name: group.display_name,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            deleted = outcome.deleted.len(),
            failed = outcome.failed.len(),
            untouched = outcome.untouched,
            "group purge finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPlanner;

    #[tokio::test]
    async fn test_only_plan_owning_groups_are_deleted() {
        let store = Arc::new(InMemoryPlanner::new());
        let busy = store.add_group("Busy").await;
        let idle = store.add_group("Idle").await;
        store.add_plan(&busy, "One").await;
        store.add_plan(&busy, "Two").await;

        let outcome = GroupPurger::new(store.clone()).purge().await.unwrap();

        assert_eq!(outcome.deleted.len(), 1);
        assert_eq!(outcome.deleted[0].group_id, busy.id);
        assert_eq!(outcome.deleted[0].plan_count, 2);
        assert_eq!(outcome.untouched, 1);
        assert_eq!(store.group_ids().await, vec![idle.id]);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_the_purge() {
        let store = Arc::new(InMemoryPlanner::new());
        let stuck = store.add_group("Stuck").await;
        let fine = store.add_group("Fine").await;
        store.add_plan(&stuck, "A").await;
        store.add_plan(&fine, "B").await;
        store.fail_group_delete(&stuck.id).await;

        let outcome = GroupPurger::new(store.clone()).purge().await.unwrap();

        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].group_id, stuck.id);
        assert_eq!(outcome.deleted.len(), 1);
        assert_eq!(outcome.deleted[0].group_id, fine.id);
    }
}
