//! Execution listing entries.

use serde::Serialize;
use serde_json::Value;

/// One entry of the engine's execution listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub id: Option<String>,
    pub status: Option<String>,
    pub mode: Option<String>,
    pub started_at: Option<String>,
    pub stopped_at: Option<String>,
    pub workflow_id: Option<String>,
    pub finished: Option<bool>,
}

impl ExecutionSummary {
    fn from_json(item: &Value) -> Self {
        Self {
            id: scalar(item, "id"),
            status: scalar(item, "status"),
            mode: scalar(item, "mode"),
            started_at: scalar(item, "startedAt"),
            stopped_at: scalar(item, "stoppedAt"),
            workflow_id: scalar(item, "workflowId"),
            finished: item.get("finished").and_then(Value::as_bool),
        }
    }
}

/// Normalize a listing response into summaries.
///
/// The list is accepted under `data`, under `executions`, or as the bare
/// response array. Anything else yields an empty list.
pub fn parse_execution_list(response: &Value) -> Vec<ExecutionSummary> {
    let items = response
        .get("data")
        .and_then(Value::as_array)
        .or_else(|| response.get("executions").and_then(Value::as_array))
        .or_else(|| response.as_array());

    items
        .map(|list| list.iter().map(ExecutionSummary::from_json).collect())
        .unwrap_or_default()
}

/// String or number field as text.
fn scalar(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
