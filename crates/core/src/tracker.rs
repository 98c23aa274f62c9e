//! Execution tracking.
//!
//! [`ExecutionTracker`] keeps one [`ExecutionRecord`] per engine execution id
//! and enforces the [`ExecutionStatus`] state machine. Persistence is behind
//! the [`ExecutionStore`] trait so the tracker can run against Postgres in
//! production and [`InMemoryExecutionStore`] in tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::start::StartedWorkflow;
use crate::status::{ExecutionStatus, STATUS_RUNNING};
use crate::types::{DbId, Timestamp};

/// A tracked workflow execution.
///
/// `finished_at` is set if and only if `status` is terminal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    /// Identifier assigned by the workflow engine.
    pub external_id: String,
    /// Local user that started the run; `None` for anonymous starts.
    pub owner_id: Option<DbId>,
    pub status: ExecutionStatus,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    /// Request body supplied at start time, stored verbatim.
    pub payload: Value,
    pub resume_url: Option<String>,
}

/// Insert DTO for a new, running execution.
#[derive(Debug, Clone)]
pub struct NewExecution {
    pub external_id: String,
    pub owner_id: Option<DbId>,
    pub started_at: Timestamp,
    pub payload: Value,
    pub resume_url: Option<String>,
}

/// Persistence for execution records.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Insert a record in `running` status. Fails with
    /// [`CoreError::Conflict`] if the external id is already tracked.
    async fn insert(&self, input: NewExecution) -> Result<ExecutionRecord, CoreError>;

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ExecutionRecord>, CoreError>;

    /// Most recently started record owned by `owner_id`.
    async fn latest_for_owner(&self, owner_id: DbId)
        -> Result<Option<ExecutionRecord>, CoreError>;

    /// Move a non-terminal record to the terminal `status`.
    ///
    /// Returns `false` if no record matched or it was already terminal; the
    /// stored row is left untouched in that case.
    async fn finish(
        &self,
        external_id: &str,
        status: &ExecutionStatus,
        finished_at: Timestamp,
    ) -> Result<bool, CoreError>;
}

/// Execution lifecycle operations over an injected [`ExecutionStore`].
#[derive(Clone)]
pub struct ExecutionTracker {
    store: Arc<dyn ExecutionStore>,
}

impl ExecutionTracker {
    pub fn new(store: Arc<dyn ExecutionStore>) -> Self {
        Self { store }
    }

    /// Record a run the engine has just accepted.
    ///
    /// Returns `Ok(None)` without touching the store when the engine did not
    /// hand back an execution id; the run exists upstream but is untracked.
    pub async fn start_execution(
        &self,
        owner_id: Option<DbId>,
        payload: Value,
        started: &StartedWorkflow,
    ) -> Result<Option<ExecutionRecord>, CoreError> {
        let Some(external_id) = started.execution_id.clone() else {
            tracing::warn!("Workflow start returned no execution id, run is untracked");
            return Ok(None);
        };

        let record = self
            .store
            .insert(NewExecution {
                external_id,
                owner_id,
                started_at: chrono::Utc::now(),
                payload,
                resume_url: started.resume_url.clone(),
            })
            .await?;

        tracing::info!(
            execution_id = %record.external_id,
            owner_id = ?record.owner_id,
            "Execution tracked",
        );
        Ok(Some(record))
    }

    pub async fn get_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ExecutionRecord>, CoreError> {
        self.store.find_by_external_id(external_id).await
    }

    pub async fn latest_for_owner(
        &self,
        owner_id: DbId,
    ) -> Result<Option<ExecutionRecord>, CoreError> {
        self.store.latest_for_owner(owner_id).await
    }

    /// Mark an execution canceled. Missing or already-terminal records are
    /// left alone, so repeated calls are harmless.
    pub async fn mark_canceled(&self, external_id: &str) -> Result<(), CoreError> {
        self.mark_finished(external_id, ExecutionStatus::Canceled).await
    }

    /// Move an execution into a terminal status.
    ///
    /// Fails with [`CoreError::InvalidTransition`] if `status` is not
    /// terminal. Missing or already-terminal records are a no-op.
    pub async fn mark_finished(
        &self,
        external_id: &str,
        status: ExecutionStatus,
    ) -> Result<(), CoreError> {
        if !status.is_terminal() {
            return Err(CoreError::InvalidTransition {
                from: STATUS_RUNNING.to_owned(),
                to: status.to_string(),
            });
        }

        let updated = self
            .store
            .finish(external_id, &status, chrono::Utc::now())
            .await?;

        if updated {
            tracing::info!(execution_id = %external_id, %status, "Execution finished");
        } else {
            tracing::debug!(
                execution_id = %external_id,
                %status,
                "No running execution to finish",
            );
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// [`ExecutionStore`] kept in process memory, keyed by external id.
#[derive(Debug, Default)]
pub struct InMemoryExecutionStore {
    records: RwLock<HashMap<String, ExecutionRecord>>,
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn insert(&self, input: NewExecution) -> Result<ExecutionRecord, CoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&input.external_id) {
            return Err(CoreError::Conflict(format!(
                "Execution {} is already tracked",
                input.external_id
            )));
        }

        let record = ExecutionRecord {
            external_id: input.external_id,
            owner_id: input.owner_id,
            status: ExecutionStatus::Running,
            started_at: input.started_at,
            finished_at: None,
            payload: input.payload,
            resume_url: input.resume_url,
        };
        records.insert(record.external_id.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ExecutionRecord>, CoreError> {
        Ok(self.records.read().await.get(external_id).cloned())
    }

    async fn latest_for_owner(
        &self,
        owner_id: DbId,
    ) -> Result<Option<ExecutionRecord>, CoreError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.owner_id == Some(owner_id))
            .max_by_key(|r| r.started_at)
            .cloned())
    }

    async fn finish(
        &self,
        external_id: &str,
        status: &ExecutionStatus,
        finished_at: Timestamp,
    ) -> Result<bool, CoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(external_id) {
            Some(record) if record.status.can_transition_to(status) => {
                record.status = status.clone();
                record.finished_at = Some(finished_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
