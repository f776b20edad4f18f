//! Repeats the scan-and-reconcile cycle on a fixed period.

mod cycle;
mod scheduler;

pub use cycle::{Cycle, CycleError};
pub use scheduler::{Scheduler, SchedulerCreationError, SchedulerError};
