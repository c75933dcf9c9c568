//! Service layer: cleanup passes, summary tasks and the keepalive cycle.

pub mod budget;
pub mod group_purge;
pub mod inventory;
pub mod keepalive_cycle;
pub mod lookup;
pub mod policies;
pub mod reconciler;
pub mod summary_task;

pub use budget::{BudgetClock, TimeBudget};
pub use group_purge::GroupPurger;
pub use inventory::{Inventory, PlannerInventory};
pub use keepalive_cycle::{CycleReport, CycleSettings, KeepaliveCycle, StageOutcome};
pub use lookup::find_plan;
pub use reconciler::{CleanupLimits, Reconciler};
pub use summary_task::{SummarySettings, SummaryTask, SummaryTaskCreator};
