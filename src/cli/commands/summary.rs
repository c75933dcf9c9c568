//! `create-summary`: file a mailbox summary task and nothing else.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::commands::CreateSummaryArgs;
use crate::cli::context::CommandContext;
use crate::cli::output::{output, CommandOutput};
use crate::services::{SummarySettings, SummaryTask, SummaryTaskCreator};

#[derive(Debug, Serialize)]
pub struct SummaryOutput {
    #[serde(flatten)]
    pub summary: SummaryTask,
}

impl CommandOutput for SummaryOutput {
    fn to_human(&self) -> String {
        let summary = &self.summary;
        let context = summary.plan_context();
        let mut lines = vec![
            format!("Summary task created: {}", summary.title()),
            format!("  id: {}", summary.task.id),
            format!(
                "  location: {} / {} / {}",
                context.group_name, context.plan_title, summary.bucket.name
            ),
            format!(
                "  inbox: {} unread of {}",
                summary.overview.unread_count, summary.overview.total_count
            ),
        ];
        if summary.recent.is_empty() {
            lines.push("  no recent mail".to_string());
        } else {
            lines.push("  recent mail:".to_string());
            lines.extend(summary.recent.iter().map(|m| format!("  {}", m.summary_line())));
        }
        match &summary.notes_error {
            Some(err) => lines.push(format!("  notes not written: {err}")),
            None if !summary.notes_written => lines.push("  notes not written".to_string()),
            None => {}
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(
    args: CreateSummaryArgs,
    config_path: Option<&Path>,
    json_mode: bool,
) -> Result<()> {
    let ctx = CommandContext::bootstrap(config_path)?;
    let plan = args
        .plan
        .unwrap_or_else(|| ctx.config.planner.plan_title.clone());
    let recent = args.recent.unwrap_or(ctx.config.mailbox.recent_count);

    let creator = SummaryTaskCreator::new(
        ctx.graph.clone(),
        ctx.clock.clone(),
        SummarySettings::from(&ctx.config),
    );
    let summary = creator
        .create_with_notes(&plan, recent)
        .await
        .with_context(|| format!("Failed to create summary task in plan '{plan}'"))?;

    output(&SummaryOutput { summary }, json_mode);
    Ok(())
}
