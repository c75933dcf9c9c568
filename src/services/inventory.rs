//! Read-only listing of groups, plans and buckets.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Bucket, Group, Plan};
use crate::domain::ports::{Directory, TaskStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanNode {
    pub plan: Plan,
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupNode {
    pub group: Group,
    pub plans: Vec<PlanNode>,
}

/// The structure visible to the configured credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub groups: Vec<GroupNode>,
}

impl Inventory {
    pub fn plan_count(&self) -> usize {
        self.groups.iter().map(|g| g.plans.len()).sum()
    }

    pub fn bucket_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| &g.plans)
            .map(|p| p.buckets.len())
            .sum()
    }
}

pub struct PlannerInventory<S: ?Sized> {
    store: Arc<S>,
}

impl<S> PlannerInventory<S>
where
    S: Directory + TaskStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn collect(&self) -> DomainResult<Inventory> {
        let mut inventory = Inventory::default();
        for group in self.store.list_groups().await? {
            let mut plans = Vec::new();
            for plan in self.store.list_plans(&group.id).await? {
                let buckets = self.store.list_buckets(&plan.id).await?;
                plans.push(PlanNode { plan, buckets });
            }
            inventory.groups.push(GroupNode { group, plans });
        }
        Ok(inventory)
    }
}
