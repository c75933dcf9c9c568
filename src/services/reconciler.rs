//! Budgeted, capped cleanup passes over a plan's tasks.
//!
//! Two passes share the same machinery:
//!
//! - [`Reconciler::cleanup_expired`] removes tasks older than the retention
//!   window, across one plan or every plan the caller can see.
//! - [`Reconciler::cleanup_duplicates`] keeps the newest `N` tasks of one plan
//!   and removes the rest.
//!
//! Neither pass fails because a single task could not be removed; that is
//! recorded as a skipped attempt. Store failures while *enumerating* abort the
//! pass and propagate.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CleanupConfig, CleanupOutcome, DeletionAttempt, PlanContext, PlanTarget, ScanScope,
    SkipReason, SkippedTask, StopReason,
};
use crate::domain::ports::{Clock, Directory, TaskStore};
use crate::services::budget::{BudgetClock, TimeBudget};
use crate::services::lookup::resolve_target;
use crate::services::policies::{self, Candidate, Location};

/// Per-pass deletion cap and time budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanupLimits {
    pub max_deletes: usize,
    pub time_budget: TimeBudget,
}

impl CleanupLimits {
    /// A cap below one is raised to one.
    pub fn new(max_deletes: usize, time_budget: TimeBudget) -> Self {
        Self {
            max_deletes: max_deletes.max(1),
            time_budget,
        }
    }
}

impl From<&CleanupConfig> for CleanupLimits {
    fn from(config: &CleanupConfig) -> Self {
        Self::new(
            config.max_delete_per_run,
            TimeBudget::from_secs(config.time_budget_seconds),
        )
    }
}

/// State threaded through one pass.
struct Pass {
    start: Instant,
    now: DateTime<Utc>,
    deleted: usize,
    outcome: CleanupOutcome,
}

impl Pass {
    fn finish(mut self, stop: StopReason) -> CleanupOutcome {
        self.outcome.stop = stop;
        self.outcome
    }
}

/// Runs cleanup passes against a store.
pub struct Reconciler<S: ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    budget: BudgetClock,
    limits: CleanupLimits,
    retention: Duration,
}

impl<S> Reconciler<S>
where
    S: Directory + TaskStore + ?Sized,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, limits: CleanupLimits) -> Self {
        Self {
            store,
            budget: BudgetClock::new(clock.clone()),
            clock,
            limits,
            retention: policies::retention_window(),
        }
    }

    /// Override the retention window of the age-based pass.
    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn limits(&self) -> CleanupLimits {
        self.limits
    }

    /// Delete every task in scope that has outlived the retention window.
    ///
    /// A non-positive time budget disables the pass: it returns
    /// [`StopReason::Disabled`] without touching the store.
    #[instrument(skip(self), fields(cap = self.limits.max_deletes))]
    pub async fn cleanup_expired(&self, scope: &ScanScope) -> DomainResult<CleanupOutcome> {
        if self.limits.time_budget.is_unlimited() {
            info!("age-based cleanup disabled by non-positive time budget");
            return Ok(CleanupOutcome::stopped(StopReason::Disabled));
        }

        let mut pass = Pass {
            start: self.budget.start(),
            now: self.clock.now_utc(),
            deleted: 0,
            outcome: CleanupOutcome::new(),
        };

        let flow = match scope {
            ScanScope::Plan(target) => {
                let Some(context) = resolve_target(&*self.store, target).await? else {
                    info!(?target, "plan not found, nothing to clean up");
                    return Ok(CleanupOutcome::stopped(StopReason::PlanNotFound));
                };
                self.expire_in_plan(&context, &mut pass).await?
            }
            ScanScope::AllPlans => self.expire_everywhere(&mut pass).await?,
        };

        let stop = match flow {
            ControlFlow::Break(stop) => stop,
            ControlFlow::Continue(()) => StopReason::Completed,
        };
        let outcome = pass.finish(stop);
        info!(
            deleted = outcome.deleted_count(),
            skipped = outcome.skipped_count(),
            ignored = outcome.ignored,
            stop = ?outcome.stop,
            "age-based cleanup finished"
        );
        Ok(outcome)
    }

    async fn expire_everywhere(&self, pass: &mut Pass) -> DomainResult<ControlFlow<StopReason>> {
        let budget = self.limits.time_budget;
        for group in self.store.list_groups().await? {
            if self.budget.expired(pass.start, budget) {
                return Ok(ControlFlow::Break(StopReason::BudgetExhausted));
            }
            for plan in self.store.list_plans(&group.id).await? {
                let context = PlanContext::from_parts(&group, &plan);
                if let ControlFlow::Break(stop) = self.expire_in_plan(&context, pass).await? {
                    return Ok(ControlFlow::Break(stop));
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    async fn expire_in_plan(
        &self,
        context: &PlanContext,
        pass: &mut Pass,
    ) -> DomainResult<ControlFlow<StopReason>> {
        let budget = self.limits.time_budget;
        if self.budget.expired(pass.start, budget) {
            return Ok(ControlFlow::Break(StopReason::BudgetExhausted));
        }

        for bucket in self.store.list_buckets(&context.plan_id).await? {
            if self.budget.expired(pass.start, budget) {
                return Ok(ControlFlow::Break(StopReason::BudgetExhausted));
            }
            debug!(plan = %context.plan_title, bucket = %bucket.name, "scanning bucket");
            let location = Location {
                group: context.group_name.clone(),
                plan: context.plan_title.clone(),
                bucket: bucket.name.clone(),
            };

            for task in self.store.list_tasks(&bucket.id).await? {
                if self.budget.expired(pass.start, budget) {
                    return Ok(ControlFlow::Break(StopReason::BudgetExhausted));
                }
                pass.outcome.examined += 1;
                let Some(candidate) = Candidate::classify(&task, &location) else {
                    pass.outcome.ignored += 1;
                    continue;
                };
                if !policies::is_expired(candidate.created, pass.now, self.retention) {
                    continue;
                }

                let attempt = self.delete(&candidate).await;
                let succeeded = attempt.is_ok();
                pass.outcome.attempts.push(attempt);
                if succeeded {
                    pass.deleted += 1;
                    if pass.deleted >= self.limits.max_deletes {
                        info!(cap = self.limits.max_deletes, "deletion cap reached");
                        return Ok(ControlFlow::Break(StopReason::CapReached));
                    }
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Keep the `keep_latest` newest tasks of the target plan and delete the
    /// rest, newest first.
    ///
    /// A non-positive time budget means no time limit here.
    #[instrument(skip(self), fields(cap = self.limits.max_deletes))]
    pub async fn cleanup_duplicates(
        &self,
        target: &PlanTarget,
        keep_latest: usize,
    ) -> DomainResult<CleanupOutcome> {
        let Some(context) = resolve_target(&*self.store, target).await? else {
            info!(?target, "plan not found, nothing to deduplicate");
            return Ok(CleanupOutcome::stopped(StopReason::PlanNotFound));
        };

        let budget = self.limits.time_budget;
        let start = self.budget.start();
        let mut outcome = CleanupOutcome::new();
        let mut candidates = Vec::new();

        for bucket in self.store.list_buckets(&context.plan_id).await? {
            if self.budget.expired(start, budget) {
                outcome.stop = StopReason::BudgetExhausted;
                return Ok(outcome);
            }
            let location = Location {
                group: context.group_name.clone(),
                plan: context.plan_title.clone(),
                bucket: bucket.name.clone(),
            };
            for task in self.store.list_tasks(&bucket.id).await? {
                if self.budget.expired(start, budget) {
                    outcome.stop = StopReason::BudgetExhausted;
                    return Ok(outcome);
                }
                outcome.examined += 1;
                match Candidate::classify(&task, &location) {
                    Some(candidate) => candidates.push(candidate),
                    None => outcome.ignored += 1,
                }
            }
        }

        let mut deleted = 0;
        for candidate in policies::beyond_latest(candidates, keep_latest) {
            if deleted >= self.limits.max_deletes {
                info!(cap = self.limits.max_deletes, "deletion cap reached");
                outcome.stop = StopReason::CapReached;
                break;
            }
            let attempt = self.delete(&candidate).await;
            if attempt.is_ok() {
                deleted += 1;
            }
            outcome.attempts.push(attempt);
        }

        info!(
            plan = %context.plan_title,
            keep_latest,
            deleted = outcome.deleted_count(),
            skipped = outcome.skipped_count(),
            ignored = outcome.ignored,
            stop = ?outcome.stop,
            "duplicate cleanup finished"
        );
        Ok(outcome)
    }

    async fn delete(&self, candidate: &Candidate) -> DeletionAttempt {
        match self
            .store
            .delete_task(&candidate.task_id, &candidate.etag)
            .await
        {
            Ok(()) => {
                debug!(task_id = %candidate.task_id, title = %candidate.title, "task deleted");
                Ok(candidate.record())
            }
            Err(err) => {
                warn!(
                    task_id = %candidate.task_id,
                    title = %candidate.title,
                    error = %err,
                    "failed to delete task"
                );
                Err(SkippedTask {
                    task: candidate.record(),
                    reason: SkipReason::from(&err),
                })
            }
        }
    }
}

impl<S: ?Sized> std::fmt::Debug for Reconciler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("limits", &self.limits)
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}
