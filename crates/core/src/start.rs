//! Workflow start request/response shaping.

use chrono::SecondsFormat;
use serde_json::{Map, Value};

use crate::types::Timestamp;

/// Value of the `source` field sent with every start request.
pub const START_SOURCE: &str = "mypoems";

/// `startedBy` value for runs started without a session.
pub const ANONYMOUS_STARTER: &str = "anonymous";

/// Build the body posted to the start webhook.
///
/// Fields of the caller's `body` object are merged over the defaults, so a
/// caller may override `source`, `ts` or `startedBy`. Non-object bodies
/// contribute nothing.
pub fn build_start_payload(body: &Value, started_by: Option<&str>, now: Timestamp) -> Value {
    let mut payload = Map::new();
    payload.insert("source".into(), Value::from(START_SOURCE));
    payload.insert(
        "ts".into(),
        Value::from(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    payload.insert(
        "startedBy".into(),
        Value::from(started_by.unwrap_or(ANONYMOUS_STARTER)),
    );

    if let Some(fields) = body.as_object() {
        for (key, value) in fields {
            payload.insert(key.clone(), value.clone());
        }
    }

    Value::Object(payload)
}

/// Identifiers the engine returned for a freshly started run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartedWorkflow {
    pub execution_id: Option<String>,
    pub resume_url: Option<String>,
}

impl StartedWorkflow {
    /// Read `executionId` / `resumeUrl` from a webhook response.
    ///
    /// Both the nested `{ "data": { .. } }` and the top-level form are
    /// accepted; the nested value wins when both are present.
    pub fn from_response(response: &Value) -> Self {
        let nested = response.get("data");
        let lookup = |key: &str| {
            nested
                .and_then(|d| id_like(d.get(key)))
                .or_else(|| id_like(response.get(key)))
        };

        Self {
            execution_id: lookup("executionId"),
            resume_url: lookup("resumeUrl"),
        }
    }
}

/// Non-empty string, or an integer rendered as a string.
fn id_like(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
