//! Entry point that selects work, schedules it and merges the results.

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::calendar::{CalendarError, WorkCalendar};
use crate::config::{ConfigError, ScheduleOptions};
use crate::critical_path::compute_critical_path;
use crate::models::ScheduleState;
use crate::{log_changes, log_checks};

use super::sequential::SequentialScheduler;

/// Errors that can occur during a scheduling run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid schedule configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("Calendar arithmetic failed: {0}")]
    Calendar(#[from] CalendarError),
    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(String),
}

/// Run the scheduler over `state`, returning how many tasks got timestamps.
///
/// Never fails: any error is logged and reported as zero tasks scheduled,
/// leaving `state` as it was.
pub fn generate_schedule(
    state: &mut ScheduleState,
    options: &ScheduleOptions,
    now_ms: i64,
) -> usize {
    match try_generate_schedule(state, options, now_ms) {
        Ok(count) => count,
        Err(err) => {
            tracing::error!(error = %err, "schedule generation failed");
            0
        }
    }
}

/// Fallible form of [`generate_schedule`].
///
/// 1. Scope: all tasks, or only those of `options.only_order_id`.
/// 2. With `force`, clear the scope's timestamps.
/// 3. Pending = scope tasks without a start (everything in scope when forced).
/// 4. Schedule pending tasks from `now_ms`, then merge only the planned
///    start/end back into the master list by id.
/// 5. Recompute slack and critical flags over the whole task list.
pub fn try_generate_schedule(
    state: &mut ScheduleState,
    options: &ScheduleOptions,
    now_ms: i64,
) -> Result<usize, ScheduleError> {
    let verbosity = options.verbosity;
    let calendar = WorkCalendar::new(&state.schedule_config)?;

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for task in &state.tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(ScheduleError::DuplicateTaskId(task.id.clone()));
        }
    }

    let in_scope = |order_id: &str| {
        options
            .only_order_id
            .as_deref()
            .map_or(true, |only| only == order_id)
    };

    // Work on copies so a failure leaves the master list untouched.
    let mut target: Vec<_> = state
        .tasks
        .iter()
        .filter(|t| in_scope(t.order_id.as_str()))
        .cloned()
        .collect();
    log_checks!(
        verbosity,
        "Scope: {} of {} tasks (order filter: {:?})",
        target.len(),
        state.tasks.len(),
        options.only_order_id
    );

    if options.force {
        log_changes!(verbosity, "Force reset of {} tasks", target.len());
        for task in &mut target {
            task.clear_schedule();
        }
    }

    let pending: Vec<_> = target
        .into_iter()
        .filter(|t| t.start_planned.is_none() || options.force)
        .collect();
    log_checks!(verbosity, "Pending: {} tasks", pending.len());

    let mut scheduled_count = 0;
    if !pending.is_empty() {
        let pending_ids: FxHashSet<&str> = pending.iter().map(|t| t.id.as_str()).collect();
        let known_ends: FxHashMap<String, i64> = state
            .tasks
            .iter()
            .filter(|t| !pending_ids.contains(t.id.as_str()))
            .filter_map(|t| t.end_planned.map(|end| (t.id.clone(), end)))
            .collect();

        let scheduled = SequentialScheduler::new(&calendar)
            .with_known_ends(known_ends)
            .with_verbosity(verbosity)
            .schedule(&pending, now_ms)?;

        let index: FxHashMap<&str, usize> = scheduled
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.as_str(), i))
            .collect();
        for master in state.tasks.iter_mut() {
            if let Some(&i) = index.get(master.id.as_str()) {
                master.start_planned = scheduled[i].start_planned;
                master.end_planned = scheduled[i].end_planned;
            }
        }
        scheduled_count = scheduled.len();
        log_changes!(verbosity, "Scheduled {} tasks", scheduled_count);
    }

    compute_critical_path(&mut state.tasks);
    Ok(scheduled_count)
}
