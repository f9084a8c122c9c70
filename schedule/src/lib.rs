//! Calendar-aware production scheduling.
//!
//! Turns customer orders into chains of shop-floor tasks and gives each task
//! a planned start and end that respect the working calendar (workday hours,
//! off weekdays, holidays) and the order of operations.
//!
//! Pipeline: [`generate_tasks_for_order`] -> [`generate_schedule`]
//! (which runs the [`SequentialScheduler`] and then
//! [`compute_critical_path`]). [`ScheduleState::from_json`] loads a persisted
//! store document, running [`migrate_schedule_config`] and [`migrate_tasks`] on legacy
//! records first.
//!
//! The core does no I/O and never reads the clock: `now` is always passed in.

pub mod calendar;
pub mod config;
pub mod critical_path;
pub mod generator;
pub mod logging;
pub mod migration;
pub mod models;
pub mod scheduler;

pub use calendar::{CalendarError, WorkCalendar};
pub use config::{ConfigError, ScheduleConfig, ScheduleOptions};
pub use critical_path::compute_critical_path;
pub use generator::{
    compute_duration, generate_tasks_for_order, IdSource, SequentialIdSource, UuidIdSource,
};
pub use migration::{migrate_schedule_config, migrate_tasks, MigrationError};
pub use models::{Operation, Order, Process, ScheduleState, Task};
pub use scheduler::{
    generate_schedule, schedule_sequential, try_generate_schedule, ScheduleError,
    SequentialScheduler,
};
