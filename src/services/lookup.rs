//! Plan lookup by title.

use tracing::debug;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Group, Plan, PlanContext, PlanTarget};
use crate::domain::ports::{Directory, TaskStore};

/// Find the first plan titled exactly `title`, walking groups in remote order.
pub async fn find_plan<S>(store: &S, title: &str) -> DomainResult<Option<(Group, Plan)>>
where
    S: Directory + TaskStore + ?Sized,
{
    for group in store.list_groups().await? {
        for plan in store.list_plans(&group.id).await? {
            if plan.title == title {
                debug!(group = %group.display_name, plan_id = %plan.id, "plan located");
                return Ok(Some((group, plan)));
            }
        }
    }
    Ok(None)
}

/// Turn a [`PlanTarget`] into a located plan, looking it up when needed.
pub async fn resolve_target<S>(store: &S, target: &PlanTarget) -> DomainResult<Option<PlanContext>>
where
    S: Directory + TaskStore + ?Sized,
{
    match target {
        PlanTarget::Known(context) => Ok(Some(context.clone())),
        PlanTarget::Title(title) => Ok(find_plan(store, title)
            .await?
            .map(|(group, plan)| PlanContext::from_parts(&group, &plan))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPlanner;

    #[tokio::test]
    async fn test_first_match_wins() {
        let store = InMemoryPlanner::new();
        let g1 = store.add_group("First").await;
        let g2 = store.add_group("Second").await;
        store.add_plan(&g1, "Other").await;
        let wanted = store.add_plan(&g1, "Mailbox check").await;
        store.add_plan(&g2, "Mailbox check").await;

        let (group, plan) = find_plan(&store, "Mailbox check").await.unwrap().unwrap();
        assert_eq!(group.id, g1.id);
        assert_eq!(plan.id, wanted.id);
    }

    #[tokio::test]
    async fn test_missing_title_is_none() {
        let store = InMemoryPlanner::new();
        store.add_group("Only").await;
        assert!(find_plan(&store, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_known_target_skips_store() {
        let store = InMemoryPlanner::new();
        let context = PlanContext {
            group_id: "g".to_string(),
            group_name: "G".to_string(),
            plan_id: "p".to_string(),
            plan_title: "P".to_string(),
        };
        let resolved = resolve_target(&store, &PlanTarget::Known(context.clone()))
            .await
            .unwrap();
        assert_eq!(resolved, Some(context));
        assert_eq!(store.call_count(), 0);
    }
}
