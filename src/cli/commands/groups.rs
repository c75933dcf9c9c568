//! `delete-all-plan-owning-groups`

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::context::CommandContext;
use crate::cli::output::{list_table, output, CommandOutput};
use crate::domain::models::GroupPurgeOutcome;
use crate::services::GroupPurger;

#[derive(Debug, Serialize)]
pub struct GroupPurgeOutput {
    #[serde(flatten)]
    pub outcome: GroupPurgeOutcome,
}

impl CommandOutput for GroupPurgeOutput {
    fn to_human(&self) -> String {
        let outcome = &self.outcome;
        let mut sections = Vec::new();

        if outcome.deleted.is_empty() {
            sections.push("No plan-owning groups found; nothing deleted.".to_string());
        } else {
            let mut table = list_table(&["group", "id", "plans"]);
            for group in &outcome.deleted {
                table.add_row(vec![
                    group.group_name.clone(),
                    group.group_id.clone(),
                    group.plan_count.to_string(),
                ]);
            }
            sections.push(format!("Deleted {} group(s):\n{table}", outcome.deleted.len()));
        }

        if !outcome.failed.is_empty() {
            let mut table = list_table(&["group", "id", "error"]);
            for group in &outcome.failed {
                table.add_row(vec![
                    group.group_name.clone(),
                    group.group_id.clone(),
                    group.error.clone(),
                ]);
            }
            sections.push(format!("Failed to delete {} group(s):\n{table}", outcome.failed.len()));
        }

        sections.push(format!("{} group(s) without plans left untouched.", outcome.untouched));
        sections.join("\n\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let ctx = CommandContext::bootstrap(config_path)?;
    let outcome = GroupPurger::new(ctx.graph.clone())
        .purge()
        .await
        .context("Failed to enumerate groups")?;
    output(&GroupPurgeOutput { outcome }, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{DeletedGroup, FailedGroup};

    #[test]
    fn test_empty_purge_message() {
        let out = GroupPurgeOutput {
            outcome: GroupPurgeOutcome {
                untouched: 2,
                ..GroupPurgeOutcome::default()
            },
        };
        let human = out.to_human();
        assert!(human.contains("nothing deleted"));
        assert!(human.contains("2 group(s) without plans"));
    }

    #[test]
    fn test_purge_output_lists_groups() {
        let out = GroupPurgeOutput {
            outcome: GroupPurgeOutcome {
                deleted: vec![DeletedGroup {
                    group_id: "g-1".into(),
                    group_name: "Sales".into(),
                    plan_count: 3,
                }],
                failed: vec![FailedGroup {
                    group_id: "g-2".into(),
                    group_name: "Legal".into(),
                    error: "forbidden".into(),
                }],
                untouched: 0,
            },
        };
        let human = out.to_human();
        assert!(human.contains("Deleted 1 group(s)"));
        assert!(human.contains("Sales"));
        assert!(human.contains("Failed to delete 1 group(s)"));

        let json = out.to_json();
        assert_eq!(json["deleted"][0]["plan_count"], 3);
        assert_eq!(json["failed"][0]["group_name"], "Legal");
    }
}
