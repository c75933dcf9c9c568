//! `structure`: print every group with its plans and buckets.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::context::CommandContext;
use crate::cli::output::{list_table, output, CommandOutput};
use crate::services::{Inventory, PlannerInventory};

#[derive(Debug, Serialize)]
pub struct StructureOutput {
    #[serde(flatten)]
    pub inventory: Inventory,
}

impl CommandOutput for StructureOutput {
    fn to_human(&self) -> String {
        let inventory = &self.inventory;
        if inventory.groups.is_empty() {
            return "No groups found.".to_string();
        }

        let mut table = list_table(&["group", "plan", "bucket", "id"]);
        for node in &inventory.groups {
            table.add_row(vec![
                node.group.display_name.clone(),
                String::new(),
                String::new(),
                node.group.id.clone(),
            ]);
            for plan in &node.plans {
                table.add_row(vec![
                    String::new(),
                    plan.plan.title.clone(),
                    String::new(),
                    plan.plan.id.clone(),
                ]);
                for bucket in &plan.buckets {
                    table.add_row(vec![
                        String::new(),
                        String::new(),
                        bucket.name.clone(),
                        bucket.id.clone(),
                    ]);
                }
            }
        }

        format!(
            "{} group(s), {} plan(s), {} bucket(s):\n{table}",
            inventory.groups.len(),
            inventory.plan_count(),
            inventory.bucket_count()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let ctx = CommandContext::bootstrap(config_path)?;
    let inventory = PlannerInventory::new(ctx.graph.clone())
        .collect()
        .await
        .context("Failed to list planner structure")?;
    output(&StructureOutput { inventory }, json_mode);
    Ok(())
}
