//! Repository for the `executions` table.

use mypoems_core::status::{STATUS_CANCELED, STATUS_ERROR, STATUS_FINISHED};
use mypoems_core::tracker::NewExecution;
use mypoems_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::execution::{Execution, ExecutionOwner};

/// Column list for `executions` queries.
const COLUMNS: &str = "\
    id, user_id, n8n_execution_id, status, started_at, finished_at, payload, resume_url";

/// Provides query operations for execution tracking.
pub struct ExecutionRepo;

impl ExecutionRepo {
    // ── Queries ──────────────────────────────────────────────────────

    /// Insert a new `running` execution, returning the inserted row.
    pub async fn create(pool: &PgPool, input: &NewExecution) -> Result<Execution, sqlx::Error> {
        let query = format!(
            "INSERT INTO executions \
                (user_id, n8n_execution_id, status, started_at, payload, resume_url) \
             VALUES ($1, $2, 'running', $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Execution>(&query)
            .bind(input.owner_id)
            .bind(&input.external_id)
            .bind(input.started_at)
            .bind(&input.payload)
            .bind(&input.resume_url)
            .fetch_one(pool)
            .await
    }

    /// Find an execution by the engine's execution ID.
    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<Execution>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM executions WHERE n8n_execution_id = $1");
        sqlx::query_as::<_, Execution>(&query)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    /// Find the most recently started execution of a user.
    pub async fn latest_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Execution>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM executions \
             WHERE user_id = $1 \
             ORDER BY started_at DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, Execution>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Owner profile of a single execution, if it has one.
    pub async fn find_owner(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<ExecutionOwner>, sqlx::Error> {
        sqlx::query_as::<_, ExecutionOwner>(
            "SELECT e.n8n_execution_id, u.email, u.avatar_url, u.first_name, u.last_name \
             FROM executions e \
             JOIN users u ON e.user_id = u.id \
             WHERE e.n8n_execution_id = $1",
        )
        .bind(external_id)
        .fetch_optional(pool)
        .await
    }

    /// Owner profiles for a batch of executions. Executions without an
    /// owner are absent from the result.
    pub async fn find_owners(
        pool: &PgPool,
        external_ids: &[String],
    ) -> Result<Vec<ExecutionOwner>, sqlx::Error> {
        sqlx::query_as::<_, ExecutionOwner>(
            "SELECT e.n8n_execution_id, u.email, u.avatar_url, u.first_name, u.last_name \
             FROM executions e \
             JOIN users u ON e.user_id = u.id \
             WHERE e.n8n_execution_id = ANY($1)",
        )
        .bind(external_ids)
        .fetch_all(pool)
        .await
    }

    // ── Status transitions ───────────────────────────────────────────

    /// Move a non-terminal execution to a terminal status.
    ///
    /// Returns `true` if a row was updated; terminal rows are never touched.
    pub async fn finish(
        pool: &PgPool,
        external_id: &str,
        status: &str,
        finished_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE executions \
             SET status = $2, finished_at = $3 \
             WHERE n8n_execution_id = $1 AND status NOT IN ($4, $5, $6)",
        )
        .bind(external_id)
        .bind(status)
        .bind(finished_at)
        .bind(STATUS_CANCELED)
        .bind(STATUS_FINISHED)
        .bind(STATUS_ERROR)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
