//! Cooperative tick-driven scheduler

pub mod delta_queue;
pub mod registry;
pub mod scheduler;
pub mod task;

pub use delta_queue::{DeltaQueue, PendingTask, TickOutcome};
pub use registry::{ErrorCode, TaskRegistry};
pub use scheduler::{Scheduler, TaskBuilder};
pub use task::{TaskFn, TaskId, TaskRecord};

pub type Result<T> = core::result::Result<T, ErrorCode>;
