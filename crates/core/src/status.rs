//! Execution status state machine.
//!
//! ```text
//! running -> canceled | finished | error
//! ```
//!
//! The three targets are terminal; nothing transitions out of them and
//! `running` is only ever assigned when a record is created. Stored values
//! are free-form strings, so unknown values are kept as [`ExecutionStatus::Other`].

use std::fmt;

use serde::{Deserialize, Serialize};

pub const STATUS_RUNNING: &str = "running";
pub const STATUS_CANCELED: &str = "canceled";
pub const STATUS_FINISHED: &str = "finished";
pub const STATUS_ERROR: &str = "error";

/// Status of a tracked execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionStatus {
    Running,
    Canceled,
    Finished,
    Error,
    /// A value written by something other than this service.
    Other(String),
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => STATUS_RUNNING,
            Self::Canceled => STATUS_CANCELED,
            Self::Finished => STATUS_FINISHED,
            Self::Error => STATUS_ERROR,
            Self::Other(s) => s,
        }
    }

    /// Whether the status ends the execution's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Canceled | Self::Finished | Self::Error)
    }

    /// Whether a record in this status may move to `next`.
    pub fn can_transition_to(&self, next: &ExecutionStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }

    /// Map a workflow-engine execution status onto a terminal tracker status.
    ///
    /// Returns `None` for statuses that do not end the execution
    /// (`running`, `waiting`, `new`, ...).
    pub fn from_engine(engine_status: &str) -> Option<Self> {
        match engine_status.to_ascii_lowercase().as_str() {
            "success" | "finished" => Some(Self::Finished),
            "error" | "crashed" | "failed" => Some(Self::Error),
            "canceled" | "cancelled" => Some(Self::Canceled),
            _ => None,
        }
    }
}

impl From<&str> for ExecutionStatus {
    fn from(value: &str) -> Self {
        match value {
            STATUS_RUNNING => Self::Running,
            STATUS_CANCELED => Self::Canceled,
            STATUS_FINISHED => Self::Finished,
            STATUS_ERROR => Self::Error,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for ExecutionStatus {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ExecutionStatus> for String {
    fn from(value: ExecutionStatus) -> Self {
        match value {
            ExecutionStatus::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_known_values_round_trip() {
        for s in [STATUS_RUNNING, STATUS_CANCELED, STATUS_FINISHED, STATUS_ERROR] {
            let status = ExecutionStatus::from(s);
            assert_matches!(status, ExecutionStatus::Running
                | ExecutionStatus::Canceled
                | ExecutionStatus::Finished
                | ExecutionStatus::Error);
            assert_eq!(status.as_str(), s);
        }
    }

    #[test]
    fn test_unknown_value_is_preserved() {
        let status = ExecutionStatus::from("waiting");
        assert_eq!(status, ExecutionStatus::Other("waiting".into()));
        assert_eq!(String::from(status), "waiting");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(ExecutionStatus::Canceled.is_terminal());
        assert!(ExecutionStatus::Finished.is_terminal());
        assert!(ExecutionStatus::Error.is_terminal());
        assert!(!ExecutionStatus::Other("waiting".into()).is_terminal());
    }

    #[test]
    fn test_transitions() {
        assert!(ExecutionStatus::Running.can_transition_to(&ExecutionStatus::Canceled));
        assert!(ExecutionStatus::Running.can_transition_to(&ExecutionStatus::Error));
        assert!(!ExecutionStatus::Running.can_transition_to(&ExecutionStatus::Running));
        assert!(!ExecutionStatus::Finished.can_transition_to(&ExecutionStatus::Canceled));
        assert!(!ExecutionStatus::Canceled.can_transition_to(&ExecutionStatus::Canceled));
        assert!(!ExecutionStatus::Error.can_transition_to(&ExecutionStatus::Running));
    }

    #[test]
    fn test_engine_status_mapping() {
        assert_eq!(ExecutionStatus::from_engine("success"), Some(ExecutionStatus::Finished));
        assert_eq!(ExecutionStatus::from_engine("crashed"), Some(ExecutionStatus::Error));
        assert_eq!(ExecutionStatus::from_engine("Canceled"), Some(ExecutionStatus::Canceled));
        assert_eq!(ExecutionStatus::from_engine("waiting"), None);
        assert_eq!(ExecutionStatus::from_engine("running"), None);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_value(ExecutionStatus::Canceled).unwrap();
        assert_eq!(json, serde_json::json!("canceled"));

        let parsed: ExecutionStatus = serde_json::from_value(serde_json::json!("new")).unwrap();
        assert_eq!(parsed, ExecutionStatus::Other("new".into()));
    }
}
