//! Core data types for the scheduling system.
//!
//! Field names follow the persisted JSON document (camelCase). Fields the
//! scheduler does not know about are carried through untouched in `extra`
//! so a round trip through this crate never loses store data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::ScheduleConfig;
use crate::migration::{migrate_schedule_config, migrate_tasks, MigrationError};

fn default_quantity() -> u32 {
    1
}

fn default_status() -> String {
    "todo".to_string()
}

/// Catalog entry: one step of a process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Base duration per unit, in minutes.
    #[serde(default)]
    pub time: u64,
    /// Employee normally assigned to this operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

/// Template a chain of tasks is generated from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// Customer order driving task generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub process_id: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Set once the order's task chain exists; it is never generated twice.
    #[serde(default)]
    pub tasks_generated: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    pub fn new(id: impl Into<String>, process_id: Option<&str>, quantity: u32) -> Self {
        Self {
            id: id.into(),
            process_id: process_id.map(str::to_string),
            quantity,
            tasks_generated: false,
            extra: Map::new(),
        }
    }
}

/// A shop-floor task: one operation of one order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub process_id: String,
    #[serde(default)]
    pub operation_id: String,
    #[serde(default)]
    pub name: String,
    /// Planned work in minutes.
    #[serde(default)]
    pub duration: u64,
    /// Planned start, ms since epoch; `None` = not scheduled.
    #[serde(default)]
    pub start_planned: Option<i64>,
    /// Planned end, ms since epoch; `None` = not scheduled.
    #[serde(default)]
    pub end_planned: Option<i64>,
    /// Immediate predecessor in the order's chain.
    #[serde(default, with = "predecessor")]
    pub depends_on: Option<String>,
    /// 1-based position in the order's chain (0 for legacy records).
    #[serde(default)]
    pub seq: u32,
    #[serde(default = "default_quantity")]
    pub qty: u32,
    #[serde(default)]
    pub critical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_ms: Option<i64>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Both planned timestamps are present.
    pub fn is_scheduled(&self) -> bool {
        self.start_planned.is_some() && self.end_planned.is_some()
    }

    pub fn predecessor(&self) -> Option<&str> {
        self.depends_on.as_deref()
    }

    /// Planned work converted to milliseconds.
    pub fn duration_ms(&self) -> i64 {
        i64::try_from(self.duration)
            .unwrap_or(i64::MAX)
            .saturating_mul(60_000)
    }

    pub fn clear_schedule(&mut self) {
        self.start_planned = None;
        self.end_planned = None;
    }
}

/// The state object exchanged with the store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleState {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub processes: Vec<Process>,
    #[serde(default)]
    pub schedule_config: ScheduleConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScheduleState {
    /// Load a persisted state document, repairing its config and upgrading
    /// legacy task records first.
    pub fn from_json(json: &str) -> Result<Self, MigrationError> {
        let mut doc: Value = serde_json::from_str(json)?;
        migrate_schedule_config(&mut doc)?;
        migrate_tasks(&mut doc)?;
        Ok(serde_json::from_value(doc)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn process(&self, process_id: &str) -> Option<&Process> {
        self.processes.iter().find(|p| p.id == process_id)
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }
}

/// `dependsOn` is persisted as a list; the chain model allows at most one entry.
mod predecessor {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(value.iter())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ids = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
        if ids.len() > 1 {
            return Err(D::Error::custom(format!(
                "branching dependencies are not supported: {:?}",
                ids
            )));
        }
        Ok(ids.into_iter().next())
    }
}
