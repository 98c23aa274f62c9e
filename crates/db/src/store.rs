//! Postgres-backed [`ExecutionStore`].

use async_trait::async_trait;
use mypoems_core::error::CoreError;
use mypoems_core::status::ExecutionStatus;
use mypoems_core::tracker::{ExecutionRecord, ExecutionStore, NewExecution};
use mypoems_core::types::{DbId, Timestamp};

use crate::repositories::ExecutionRepo;
use crate::DbPool;

/// PostgreSQL unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// [`ExecutionStore`] over the `executions` table.
#[derive(Clone)]
pub struct PgExecutionStore {
    pool: DbPool,
}

impl PgExecutionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExecutionStore for PgExecutionStore {
    async fn insert(&self, input: NewExecution) -> Result<ExecutionRecord, CoreError> {
        ExecutionRepo::create(&self.pool, &input)
            .await
            .map(ExecutionRecord::from)
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                    CoreError::Conflict(format!(
                        "Execution {} is already tracked",
                        input.external_id
                    ))
                }
                _ => store_error(e),
            })
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ExecutionRecord>, CoreError> {
        ExecutionRepo::find_by_external_id(&self.pool, external_id)
            .await
            .map(|row| row.map(ExecutionRecord::from))
            .map_err(store_error)
    }

    async fn latest_for_owner(
        &self,
        owner_id: DbId,
    ) -> Result<Option<ExecutionRecord>, CoreError> {
        ExecutionRepo::latest_for_user(&self.pool, owner_id)
            .await
            .map(|row| row.map(ExecutionRecord::from))
            .map_err(store_error)
    }

    async fn finish(
        &self,
        external_id: &str,
        status: &ExecutionStatus,
        finished_at: Timestamp,
    ) -> Result<bool, CoreError> {
        ExecutionRepo::finish(&self.pool, external_id, status.as_str(), finished_at)
            .await
            .map_err(store_error)
    }
}

fn store_error(err: sqlx::Error) -> CoreError {
    CoreError::Store(err.to_string())
}
