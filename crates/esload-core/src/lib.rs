//! Bounded-concurrency submission: work budget, single-attempt workers, and the
//! coordinator that keeps the pool topped up until the quota is spent.

pub mod budget;
pub mod coordinator;
pub mod worker;

pub use budget::WorkBudget;
pub use coordinator::{Coordinator, CoordinatorState, RunReport};
