//! `run-cleanup-cycle`: summary task, duplicate pass, optional age pass.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::context::CommandContext;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{CleanupOutcome, SkipReason, StopReason};
use crate::services::{CycleReport, KeepaliveCycle, StageOutcome};

/// Listed deletions and skips are capped at this many lines per stage.
const MAX_LISTED: usize = 20;

#[derive(Debug, Serialize)]
pub struct CycleOutput {
    #[serde(flatten)]
    pub report: CycleReport,
}

impl CommandOutput for CycleOutput {
    fn to_human(&self) -> String {
        let summary = &self.report.summary;
        let context = summary.plan_context();
        let mut lines = vec![
            format!("Summary task created: {}", summary.title()),
            format!(
                "  location: {} / {} / {}",
                context.group_name, context.plan_title, summary.bucket.name
            ),
            format!(
                "  inbox: {} unread of {}",
                summary.overview.unread_count, summary.overview.total_count
            ),
        ];
        if let Some(err) = &summary.notes_error {
            lines.push(format!("  notes not written: {err}"));
        }

        lines.push(String::new());
        lines.extend(render_stage("Duplicate cleanup", &self.report.duplicates));
        lines.push(String::new());
        lines.extend(render_stage("Expired-task cleanup", &self.report.expired));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn render_stage(label: &str, stage: &StageOutcome) -> Vec<String> {
    match stage {
        StageOutcome::Completed(outcome) => render_outcome(label, outcome),
        StageOutcome::Skipped(reason) => vec![format!("{label}: skipped ({reason})")],
        StageOutcome::Failed(err) => vec![format!("{label}: failed: {err}")],
    }
}

pub fn render_outcome(label: &str, outcome: &CleanupOutcome) -> Vec<String> {
    let mut lines = vec![format!(
        "{label}: deleted {}, skipped {}, examined {}, ignored {} ({})",
        outcome.deleted_count(),
        outcome.skipped_count(),
        outcome.examined,
        outcome.ignored,
        describe_stop(outcome.stop)
    )];
    for deleted in outcome.deleted().take(MAX_LISTED) {
        lines.push(format!(
            "  - deleted {} [{}] {}",
            deleted.created_at,
            deleted.plan,
            truncate(&deleted.title, 60)
        ));
    }
    for skipped in outcome.skipped().take(MAX_LISTED) {
        lines.push(format!(
            "  - skipped {} ({})",
            truncate(&skipped.task.title, 60),
            describe_skip(&skipped.reason)
        ));
    }
    let listed = outcome.deleted_count().min(MAX_LISTED) + outcome.skipped_count().min(MAX_LISTED);
    let total = outcome.attempts.len();
    if total > listed {
        lines.push(format!("  ... and {} more", total - listed));
    }
    lines
}

fn describe_stop(stop: StopReason) -> &'static str {
    match stop {
        StopReason::Completed => "completed",
        StopReason::BudgetExhausted => "time budget exhausted",
        StopReason::CapReached => "deletion cap reached",
        StopReason::PlanNotFound => "plan not found",
        StopReason::Disabled => "disabled by time budget",
    }
}

fn describe_skip(reason: &SkipReason) -> String {
    match reason {
        SkipReason::Conflict => "changed concurrently".to_string(),
        SkipReason::NotFound => "already gone".to_string(),
        SkipReason::Failed(err) => err.clone(),
    }
}

pub async fn execute(config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let ctx = CommandContext::bootstrap(config_path)?;
    let cycle = KeepaliveCycle::from_config(ctx.graph.clone(), ctx.clock.clone(), &ctx.config);
    let report = cycle.run().await.context("Keepalive cycle failed")?;
    output(&CycleOutput { report }, json_mode);
    Ok(())
}
