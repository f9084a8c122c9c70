//! Single-timeline scheduler that consumes working time only.

use rustc_hash::FxHashMap;

use crate::calendar::{CalendarError, WorkCalendar};
use crate::models::Task;
use crate::{log_changes, log_checks, log_debug};

/// Assigns planned start/end timestamps to tasks one after another.
///
/// All tasks share one cursor that only moves forward, so independent
/// chains are laid end to end rather than in parallel. Each task consumes
/// exactly its duration of workday time; off days and the hours outside
/// the workday window are skipped, never counted.
pub struct SequentialScheduler<'a> {
    calendar: &'a WorkCalendar,
    /// End times of tasks scheduled before this run: task_id -> end ms.
    known_ends: FxHashMap<String, i64>,
    verbosity: u8,
}

impl<'a> SequentialScheduler<'a> {
    pub fn new(calendar: &'a WorkCalendar) -> Self {
        Self {
            calendar,
            known_ends: FxHashMap::default(),
            verbosity: 0,
        }
    }

    /// Provide end times for predecessors that are not part of the input.
    pub fn with_known_ends(mut self, known_ends: FxHashMap<String, i64>) -> Self {
        self.known_ends = known_ends;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Schedule every task lacking a start or an end, in input order.
    ///
    /// Tasks must already be ordered so predecessors come first. Returns
    /// copies of the tasks that were scheduled; fully scheduled input
    /// tasks are skipped and not returned.
    pub fn schedule(&self, tasks: &[Task], now_ms: i64) -> Result<Vec<Task>, CalendarError> {
        let mut pending: Vec<Task> = tasks
            .iter()
            .filter(|t| !t.is_scheduled())
            .cloned()
            .collect();
        if pending.is_empty() {
            return Ok(pending);
        }

        let verbosity = self.verbosity;
        let mut ends: FxHashMap<String, i64> =
            FxHashMap::with_capacity_and_hasher(pending.len(), Default::default());
        let mut cursor = self.calendar.align_to_workday(now_ms)?;

        for task in &mut pending {
            if let Some(pred) = task.predecessor() {
                match ends.get(pred).or_else(|| self.known_ends.get(pred)) {
                    Some(&ready) => {
                        log_checks!(verbosity, "  {} waits for {} until {}", task.id, pred, ready);
                        cursor = cursor.max(ready);
                    }
                    None => {
                        log_checks!(
                            verbosity,
                            "  {}: predecessor {} not scheduled, ignoring",
                            task.id,
                            pred
                        );
                    }
                }
            }
            cursor = self.calendar.align_to_workday(cursor)?;

            let start = cursor;
            let end = self.consume_working_time(start, task.duration_ms())?;

            task.start_planned = Some(start);
            task.end_planned = Some(end);
            ends.insert(task.id.clone(), end);
            cursor = end;

            log_changes!(
                verbosity,
                "  Scheduled task {} ({} min) from {} to {}",
                task.id,
                task.duration,
                start,
                end
            );
        }

        Ok(pending)
    }

    /// Walk forward from `start` until `remaining_ms` of workday time is used.
    fn consume_working_time(
        &self,
        start: i64,
        mut remaining_ms: i64,
    ) -> Result<i64, CalendarError> {
        let mut pointer = start;
        while remaining_ms > 0 {
            let day_end = self.calendar.end_of_workday(pointer)?;
            let capacity = day_end - pointer;
            if remaining_ms <= capacity {
                pointer += remaining_ms;
                remaining_ms = 0;
            } else {
                remaining_ms -= capacity;
                // `day_end` may be 00:00 of the next date; step from the window's own day
                pointer = self.calendar.start_of_next_working_day(pointer)?;
                log_debug!(
                    self.verbosity,
                    "    day full at {}, {}ms left, continuing at {}",
                    day_end,
                    remaining_ms,
                    pointer
                );
            }
        }
        Ok(pointer)
    }
}

/// Schedule `tasks` against `calendar` starting no earlier than `now_ms`.
pub fn schedule_sequential(
    tasks: &[Task],
    calendar: &WorkCalendar,
    now_ms: i64,
) -> Result<Vec<Task>, CalendarError> {
    SequentialScheduler::new(calendar).schedule(tasks, now_ms)
}
