//! Sequential scheduler and the orchestrator that drives it.
//!
//! The scheduler lays pending tasks onto a single timeline of working
//! time; the orchestrator decides which tasks are pending, merges the
//! resulting timestamps back into the store's task list and refreshes the
//! critical-path flags.

mod orchestrator;
mod sequential;

pub use orchestrator::{generate_schedule, try_generate_schedule, ScheduleError};
pub use sequential::{schedule_sequential, SequentialScheduler};
