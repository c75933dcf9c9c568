//! Adapters: the Graph HTTP client, an in-memory planner and clocks.

pub mod clock;
pub mod graph;
pub mod memory;

pub use clock::{ManualClock, SystemClock};
pub use graph::{GraphClient, TokenProvider};
pub use memory::{InMemoryPlanner, TaskSeed};
