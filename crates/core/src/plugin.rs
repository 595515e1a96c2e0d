//! Task extraction from plugin payloads.
//!
//! A plugin's structured payload carries its files and the tasks each file
//! defines:
//!
//! ```json
//! {
//!   "files": [
//!     { "filename": "attacks.py",
//!       "tasks": [ { "name": "fgsm", "output_type": "tensor" } ] }
//!   ]
//! }
//! ```
//!
//! References into a plugin may select a single task by name; these helpers
//! answer whether a selection still resolves against a given payload.
//! Traversal is tolerant: missing or mistyped keys yield an empty task set
//! rather than an error.

use serde_json::Value;

/// Collect the task names defined across all files of a plugin payload.
pub fn task_names(payload: &Value) -> Vec<String> {
    let files = match payload.get("files").and_then(Value::as_array) {
        Some(files) => files,
        None => return Vec::new(),
    };

    files
        .iter()
        .filter_map(|file| file.get("tasks").and_then(Value::as_array))
        .flatten()
        .filter_map(|task| task.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

/// Whether a task with the given name exists anywhere in the payload.
pub fn has_task(payload: &Value, name: &str) -> bool {
    task_names(payload).iter().any(|t| t == name)
}
