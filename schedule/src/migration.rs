//! Compatibility migration for task records persisted by older versions.
//!
//! Works on the raw JSON document so records that would not deserialize
//! as-is (non-list `dependsOn`, missing timing fields, a malformed
//! `scheduleConfig`) can still be loaded.

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while loading a persisted state document.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("state document must be a JSON object")]
    NotAnObject,
    #[error("tasks must be a JSON list")]
    TasksNotAList,
    #[error("task record at index {0} is not a JSON object")]
    TaskNotAnObject(usize),
    #[error("task {task} depends on {count} predecessors; only one is supported")]
    BranchingDependency { task: String, count: usize },
    #[error("invalid state document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fill in default values on legacy task records.
///
/// Missing `startPlanned`/`endPlanned` become null, a missing or non-list
/// `dependsOn` becomes `[]`, missing `critical` becomes false and missing
/// `seq` becomes 0. Returns the number of task records changed. Running it
/// again on its own output changes nothing.
///
/// An absent or null `tasks` is left alone; any other non-list value, and a
/// record naming more than one predecessor, is an error.
pub fn migrate_tasks(state: &mut Value) -> Result<usize, MigrationError> {
    let Some(doc) = state.as_object_mut() else {
        return Err(MigrationError::NotAnObject);
    };
    let tasks = match doc.get_mut("tasks") {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::Array(tasks)) => tasks,
        Some(_) => return Err(MigrationError::TasksNotAList),
    };

    let mut migrated = 0;
    for (idx, task) in tasks.iter_mut().enumerate() {
        let record = task
            .as_object_mut()
            .ok_or(MigrationError::TaskNotAnObject(idx))?;
        if migrate_record(idx, record)? {
            migrated += 1;
        }
    }
    Ok(migrated)
}

/// Replace unusable `scheduleConfig` values with their defaults.
///
/// A missing, null or non-object config falls back to the whole default
/// config; a non-list `offWeekdays` falls back to Saturday/Sunday and a
/// non-list `holidays` to none. Each fallback is logged as a warning.
/// Returns whether the document was changed.
pub fn migrate_schedule_config(state: &mut Value) -> Result<bool, MigrationError> {
    let Some(doc) = state.as_object_mut() else {
        return Err(MigrationError::NotAnObject);
    };
    match doc.get("scheduleConfig") {
        None => {
            tracing::warn!("scheduleConfig missing, using defaults");
            return Ok(false);
        }
        Some(Value::Object(_)) => {}
        Some(other) => {
            tracing::warn!(value = %other, "scheduleConfig is not an object, using defaults");
            doc.remove("scheduleConfig");
            return Ok(true);
        }
    }
    let Some(config) = doc.get_mut("scheduleConfig").and_then(Value::as_object_mut) else {
        return Ok(false);
    };

    let mut changed = false;
    if config.get("offWeekdays").is_some_and(|v| !v.is_array()) {
        tracing::warn!("scheduleConfig.offWeekdays is not a list, using Saturday/Sunday");
        config.remove("offWeekdays");
        changed = true;
    }
    if config.get("holidays").is_some_and(|v| !v.is_array()) {
        tracing::warn!("scheduleConfig.holidays is not a list, using none");
        config.insert("holidays".to_string(), Value::Array(Vec::new()));
        changed = true;
    }
    Ok(changed)
}

fn migrate_record(idx: usize, record: &mut Map<String, Value>) -> Result<bool, MigrationError> {
    let mut changed = false;

    for key in ["startPlanned", "endPlanned"] {
        if !record.contains_key(key) {
            record.insert(key.to_string(), Value::Null);
            changed = true;
        }
    }

    match record.get("dependsOn") {
        Some(Value::Array(ids)) if ids.len() > 1 => {
            let task = match record.get("id") {
                Some(Value::String(id)) => id.clone(),
                _ => format!("#{}", idx),
            };
            return Err(MigrationError::BranchingDependency {
                task,
                count: ids.len(),
            });
        }
        Some(Value::Array(_)) => {}
        _ => {
            record.insert("dependsOn".to_string(), Value::Array(Vec::new()));
            changed = true;
        }
    }

    if !record.contains_key("critical") {
        record.insert("critical".to_string(), Value::Bool(false));
        changed = true;
    }

    if !record.contains_key("seq") {
        record.insert("seq".to_string(), Value::from(0));
        changed = true;
    }

    Ok(changed)
}
