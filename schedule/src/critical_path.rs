//! Slack and critical-path flags for a scheduled task set.
//!
//! Slack is measured against the latest planned end across all scheduled
//! tasks. This only equals true CPM slack because the sequential scheduler
//! lays every task on one timeline; once tasks can run in parallel this
//! needs a forward/backward pass over the dependency graph instead.

use crate::models::Task;

/// Set `slack_ms` and `critical` on every fully scheduled task.
///
/// Returns the project end (latest `end_planned`), or `None` when no task
/// is scheduled, in which case nothing is touched. Unscheduled tasks keep
/// whatever values they had.
pub fn compute_critical_path(tasks: &mut [Task]) -> Option<i64> {
    let project_end = tasks
        .iter()
        .filter(|t| t.is_scheduled())
        .filter_map(|t| t.end_planned)
        .max()?;

    for task in tasks.iter_mut() {
        if !task.is_scheduled() {
            continue;
        }
        if let Some(end) = task.end_planned {
            let slack = project_end - end;
            task.slack_ms = Some(slack);
            task.critical = slack == 0;
        }
    }

    Some(project_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn timed(id: &str, start: Option<i64>, end: Option<i64>) -> Task {
        Task {
            id: id.to_string(),
            order_id: "o1".to_string(),
            process_id: "p1".to_string(),
            operation_id: "op".to_string(),
            name: id.to_string(),
            duration: 0,
            start_planned: start,
            end_planned: end,
            depends_on: None,
            seq: 0,
            qty: 1,
            critical: false,
            slack_ms: None,
            status: "todo".to_string(),
            assignees: vec![],
            extra: Map::new(),
        }
    }

    #[test]
    fn test_latest_end_is_critical() {
        let mut tasks = vec![
            timed("a", Some(0), Some(100)),
            timed("b", Some(100), Some(250)),
            timed("c", Some(250), Some(400)),
        ];
        assert_eq!(compute_critical_path(&mut tasks), Some(400));

        assert_eq!(tasks[0].slack_ms, Some(300));
        assert_eq!(tasks[1].slack_ms, Some(150));
        assert_eq!(tasks[2].slack_ms, Some(0));
        assert!(!tasks[0].critical);
        assert!(!tasks[1].critical);
        assert!(tasks[2].critical);
    }

    #[test]
    fn test_ties_are_all_critical() {
        let mut tasks = vec![timed("a", Some(0), Some(50)), timed("b", Some(50), Some(50))];
        compute_critical_path(&mut tasks);
        assert!(tasks.iter().all(|t| t.critical));
    }

    #[test]
    fn test_unscheduled_tasks_untouched() {
        let mut pending = timed("p", Some(10), None);
        pending.critical = true;
        let mut tasks = vec![timed("a", Some(0), Some(100)), pending];
        compute_critical_path(&mut tasks);

        assert!(tasks[1].critical);
        assert_eq!(tasks[1].slack_ms, None);
        assert!(tasks[0].critical);
    }

    #[test]
    fn test_nothing_scheduled_is_noop() {
        let mut tasks = vec![timed("a", None, None)];
        assert_eq!(compute_critical_path(&mut tasks), None);
        assert_eq!(tasks[0].slack_ms, None);
        assert_eq!(compute_critical_path(&mut []), None);
    }

    #[test]
    fn test_previously_critical_task_cleared() {
        let mut early = timed("a", Some(0), Some(100));
        early.critical = true;
        let mut tasks = vec![early, timed("b", Some(100), Some(200))];
        compute_critical_path(&mut tasks);
        assert!(!tasks[0].critical);
        assert_eq!(tasks[0].slack_ms, Some(100));
    }
}
