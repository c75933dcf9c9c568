//! The scheduled keepalive cycle.
//!
//! 1. File a mailbox summary task. Failure here aborts the cycle.
//! 2. Drop older summary tasks from the same plan, keeping the newest.
//! 3. Optionally sweep tasks past the retention window from that plan.
//!
//! Stages 2 and 3 never abort the cycle; their errors land in the report.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument};

use crate::domain::errors::DomainResult;
use crate::domain::models::{CleanupOutcome, Config, PlanTarget, ScanScope};
use crate::domain::ports::{Clock, Directory, Mailbox, TaskStore};
use crate::services::reconciler::{CleanupLimits, Reconciler};
use crate::services::summary_task::{SummarySettings, SummaryTask, SummaryTaskCreator};

/// Summary tasks kept by the duplicate pass.
pub const KEEP_LATEST: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSettings {
    pub plan_title: String,
    pub recent_count: usize,
    pub enable_old_cleanup: bool,
}

impl From<&Config> for CycleSettings {
    fn from(config: &Config) -> Self {
        Self {
            plan_title: config.planner.plan_title.clone(),
            recent_count: config.mailbox.recent_count,
            enable_old_cleanup: config.cleanup.enable_old_cleanup,
        }
    }
}

/// How a cleanup stage of the cycle ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StageOutcome {
    Completed(CleanupOutcome),
    Skipped(String),
    Failed(String),
}

impl StageOutcome {
    fn from_result(stage: &str, result: DomainResult<CleanupOutcome>) -> Self {
        match result {
            Ok(outcome) => Self::Completed(outcome),
            Err(err) => {
                error!(stage, error = %err, "cleanup stage failed");
                Self::Failed(err.to_string())
            }
        }
    }

    pub fn outcome(&self) -> Option<&CleanupOutcome> {
        match self {
            Self::Completed(outcome) => Some(outcome),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub summary: SummaryTask,
    pub duplicates: StageOutcome,
    pub expired: StageOutcome,
}

pub struct KeepaliveCycle<S: ?Sized> {
    creator: SummaryTaskCreator<S>,
    reconciler: Reconciler<S>,
    settings: CycleSettings,
}

impl<S> KeepaliveCycle<S>
where
    S: Directory + Mailbox + TaskStore + ?Sized,
{
    pub fn new(
        creator: SummaryTaskCreator<S>,
        reconciler: Reconciler<S>,
        settings: CycleSettings,
    ) -> Self {
        Self {
            creator,
            reconciler,
            settings,
        }
    }

    /// Wire a cycle straight from configuration.
    pub fn from_config(store: Arc<S>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self::new(
            SummaryTaskCreator::new(store.clone(), clock.clone(), SummarySettings::from(config)),
            Reconciler::new(store, clock, CleanupLimits::from(&config.cleanup)),
            CycleSettings::from(config),
        )
    }

    #[instrument(skip(self), fields(plan = %self.settings.plan_title))]
    pub async fn run(&self) -> DomainResult<CycleReport> {
        let summary = self
            .creator
            .create_with_notes(&self.settings.plan_title, self.settings.recent_count)
            .await?;
        let target = PlanTarget::Known(summary.plan_context().clone());

        let duplicates = StageOutcome::from_result(
            "duplicates",
            self.reconciler.cleanup_duplicates(&target, KEEP_LATEST).await,
        );

        let expired = if self.settings.enable_old_cleanup {
            StageOutcome::from_result(
                "expired",
                self.reconciler
                    .cleanup_expired(&ScanScope::Plan(target))
                    .await,
            )
        } else {
            StageOutcome::Skipped("old-task cleanup is disabled".to_string())
        };

        info!(task_id = %summary.task.id, "keepalive cycle finished");
        Ok(CycleReport {
            summary,
            duplicates,
            expired,
        })
    }
}
