//! Expansion of an order into its chain of tasks.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::{Operation, Order, Process, ScheduleState, Task};

/// Source of task ids. Ids must be unique across the whole store.
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

/// Random ids of the form `task-<uuid>`.
#[derive(Clone, Debug, Default)]
pub struct UuidIdSource;

impl IdSource for UuidIdSource {
    fn next_id(&mut self) -> String {
        format!("task-{}", Uuid::new_v4().simple())
    }
}

/// Deterministic ids `<prefix>-1`, `<prefix>-2`, ...
#[derive(Clone, Debug)]
pub struct SequentialIdSource {
    prefix: String,
    next: u64,
}

impl SequentialIdSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdSource for SequentialIdSource {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Planned minutes for one operation of an order: `time * max(1, quantity)`.
pub fn compute_duration(operation: &Operation, order: &Order) -> u64 {
    operation
        .time
        .saturating_mul(u64::from(order.quantity.max(1)))
}

/// Generate the linear task chain for an order.
///
/// An order without a process, with an unknown process, or whose process
/// has no operations yields an empty list. Task `i` depends on task `i - 1`.
pub fn generate_tasks_for_order<'a, F>(
    order: &Order,
    lookup_process: F,
    ids: &mut dyn IdSource,
) -> Vec<Task>
where
    F: FnOnce(&str) -> Option<&'a Process>,
{
    let Some(process_id) = order.process_id.as_deref() else {
        return Vec::new();
    };
    let Some(process) = lookup_process(process_id) else {
        return Vec::new();
    };

    let mut tasks: Vec<Task> = process
        .operations
        .iter()
        .enumerate()
        .map(|(idx, op)| {
            let duration = compute_duration(op, order);
            // Fields the store UI and auto-assignment read by name
            let mut extra = Map::new();
            extra.insert("opName".to_string(), Value::from(op.name.clone()));
            extra.insert("estMin".to_string(), Value::from(duration));
            Task {
                id: ids.next_id(),
                order_id: order.id.clone(),
                process_id: process.id.clone(),
                operation_id: op.id.clone(),
                name: op.name.clone(),
                duration,
                start_planned: None,
                end_planned: None,
                depends_on: None,
                seq: idx as u32 + 1,
                qty: order.quantity.max(1),
                critical: false,
                slack_ms: None,
                status: "todo".to_string(),
                assignees: op.assignee.iter().cloned().collect(),
                extra,
            }
        })
        .collect();

    for i in 1..tasks.len() {
        tasks[i].depends_on = Some(tasks[i - 1].id.clone());
    }

    tasks
}

impl ScheduleState {
    /// Generate chains for every order not yet marked `tasksGenerated`.
    ///
    /// Appends the new tasks, marks each processed order and returns the
    /// number of tasks added. Orders whose process yields nothing are
    /// still marked so they are not retried on every load.
    pub fn generate_missing_tasks(&mut self, ids: &mut dyn IdSource) -> usize {
        let mut added = 0;
        for order in self.orders.iter_mut().filter(|o| !o.tasks_generated) {
            let processes = &self.processes;
            let tasks = generate_tasks_for_order(
                order,
                |pid| processes.iter().find(|p| p.id == pid),
                ids,
            );
            added += tasks.len();
            self.tasks.extend(tasks);
            order.tasks_generated = true;
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(id: &str, time: u64) -> Operation {
        Operation {
            id: id.to_string(),
            name: format!("op {}", id),
            time,
            assignee: None,
        }
    }

    fn process(id: &str, operations: Vec<Operation>) -> Process {
        Process {
            id: id.to_string(),
            name: format!("process {}", id),
            operations,
        }
    }

    #[test]
    fn test_linear_chain() {
        let proc = process("p1", vec![op("cut", 10), op("weld", 20), op("paint", 5)]);
        let order = Order::new("o1", Some("p1"), 3);
        let mut ids = SequentialIdSource::new("t");

        let tasks = generate_tasks_for_order(&order, |_| Some(&proc), &mut ids);

        assert_eq!(tasks.len(), 3);
        assert_eq!(
            tasks.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            vec!["t-1", "t-2", "t-3"]
        );
        assert_eq!(
            tasks.iter().map(|t| t.duration).collect::<Vec<_>>(),
            vec![30, 60, 15]
        );
        assert_eq!(
            tasks.iter().map(|t| t.seq).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(tasks[0].depends_on, None);
        assert_eq!(tasks[1].predecessor(), Some("t-1"));
        assert_eq!(tasks[2].predecessor(), Some("t-2"));
        for task in &tasks {
            assert_eq!(task.order_id, "o1");
            assert_eq!(task.process_id, "p1");
            assert_eq!(task.qty, 3);
            assert!(!task.is_scheduled());
        }
    }

    #[test]
    fn test_zero_quantity_counts_as_one() {
        let operation = op("cut", 45);
        let order = Order::new("o1", Some("p1"), 0);
        assert_eq!(compute_duration(&operation, &order), 45);
    }

    #[test]
    fn test_nothing_to_generate() {
        let mut ids = SequentialIdSource::new("t");
        let empty = process("p1", vec![]);

        let no_process = Order::new("o1", None, 1);
        assert!(generate_tasks_for_order(&no_process, |_| Some(&empty), &mut ids).is_empty());

        let unknown = Order::new("o2", Some("missing"), 1);
        assert!(generate_tasks_for_order(&unknown, |_| None, &mut ids).is_empty());

        let no_ops = Order::new("o3", Some("p1"), 1);
        assert!(generate_tasks_for_order(&no_ops, |_| Some(&empty), &mut ids).is_empty());
    }

    #[test]
    fn test_assignee_copied() {
        let mut operation = op("cut", 10);
        operation.assignee = Some("emp-7".to_string());
        let proc = process("p1", vec![operation]);
        let order = Order::new("o1", Some("p1"), 3);

        let tasks =
            generate_tasks_for_order(&order, |_| Some(&proc), &mut SequentialIdSource::new("t"));
        assert_eq!(tasks[0].assignees, vec!["emp-7".to_string()]);
        assert_eq!(tasks[0].status, "todo");
        assert_eq!(tasks[0].extra["opName"], serde_json::json!(tasks[0].name));
        assert_eq!(tasks[0].extra["estMin"], serde_json::json!(30));

        let value = serde_json::to_value(&tasks[0]).unwrap();
        assert_eq!(value["estMin"], serde_json::json!(30));
    }

    #[test]
    fn test_uuid_ids_unique() {
        let mut ids = UuidIdSource;
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(a.starts_with("task-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_missing_tasks_marks_orders() {
        let mut state = ScheduleState::default();
        state
            .processes
            .push(process("p1", vec![op("cut", 10), op("weld", 20)]));
        state.orders.push(Order::new("o1", Some("p1"), 1));
        state.orders.push(Order::new("o2", None, 1));
        let mut done = Order::new("o3", Some("p1"), 1);
        done.tasks_generated = true;
        state.orders.push(done);

        let mut ids = SequentialIdSource::new("t");
        assert_eq!(state.generate_missing_tasks(&mut ids), 2);
        assert!(state.orders.iter().all(|o| o.tasks_generated));
        assert!(state.tasks.iter().all(|t| t.order_id == "o1"));

        // Second call never regenerates
        assert_eq!(state.generate_missing_tasks(&mut ids), 0);
        assert_eq!(state.tasks.len(), 2);
    }
}
