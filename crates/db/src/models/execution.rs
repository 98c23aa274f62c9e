//! Execution entity model.

use mypoems_core::status::ExecutionStatus;
use mypoems_core::tracker::ExecutionRecord;
use mypoems_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::user::UserProfile;

/// Full row from the `executions` table.
#[derive(Debug, Clone, FromRow)]
pub struct Execution {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub n8n_execution_id: String,
    pub status: String,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    pub payload: Option<serde_json::Value>,
    pub resume_url: Option<String>,
}

impl From<Execution> for ExecutionRecord {
    fn from(row: Execution) -> Self {
        Self {
            external_id: row.n8n_execution_id,
            owner_id: row.user_id,
            status: ExecutionStatus::from(row.status),
            started_at: row.started_at,
            finished_at: row.finished_at,
            payload: row.payload.unwrap_or(serde_json::Value::Null),
            resume_url: row.resume_url,
        }
    }
}

/// An execution id joined with its owner's profile columns.
#[derive(Debug, Clone, FromRow)]
pub struct ExecutionOwner {
    pub n8n_execution_id: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<ExecutionOwner> for UserProfile {
    fn from(row: ExecutionOwner) -> Self {
        Self {
            email: row.email,
            avatar: row.avatar_url,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}
