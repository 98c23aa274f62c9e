//! Handlers for workflow executions (start, status, listing, cancel, resume).
//!
//! The workflow engine is the source of truth for a run. The local tracker
//! and the owner lookups only enrich responses, so their failures are logged
//! and the response goes out without the missing fields.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use mypoems_core::error::CoreError;
use mypoems_core::extraction::{extract_poems, find_resume_url, run_data, PoemEntry};
use mypoems_core::listing::{clamp_limit, resolve_workflow_id};
use mypoems_core::start::{build_start_payload, StartedWorkflow};
use mypoems_core::status::ExecutionStatus;
use mypoems_core::tracker::ExecutionRecord;
use mypoems_core::types::{DbId, Timestamp};
use mypoems_db::models::user::UserProfile;
use mypoems_db::repositories::{ExecutionRepo, UserRepo};
use mypoems_n8n::{ExecutionSummary, N8nError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query for `GET /api/v1/execution`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionQuery {
    pub execution_id: Option<String>,
}

/// Query for `GET /api/v1/executions`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub workflow_id: Option<String>,
    pub limit: Option<i64>,
}

/// Body of `POST /api/v1/cancel`. The engine's ids may arrive as numbers.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    #[serde(default, deserialize_with = "trimmed_id")]
    #[validate(length(min = 1, message = "Missing executionId"))]
    pub execution_id: String,
}

/// Body of `POST /api/v1/resume`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRequest {
    #[serde(default, deserialize_with = "trimmed_string")]
    #[validate(
        length(min = 1, message = "Missing resumeUrl"),
        url(message = "resumeUrl must be an absolute URL")
    )]
    pub resume_url: String,
    /// Payload forwarded to the engine; the whole request body when absent.
    #[serde(default)]
    pub data: Option<Value>,
}

/// Status of one execution merged with the content found in its run data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionView {
    pub execution_id: String,
    /// Engine-reported status (`running`, `waiting`, `success`, ...).
    pub status: Option<String>,
    pub finished: Option<bool>,
    pub poems: Vec<PoemEntry>,
    pub chapters: Option<Vec<Value>>,
    pub book_html: Option<String>,
    pub book_pdf: Option<String>,
    pub source_node: Option<String>,
    pub resume_url: Option<String>,
    pub user: Option<UserProfile>,
}

/// One listing row: the engine summary plus the local owner, if known.
#[derive(Debug, Serialize)]
pub struct ListedExecution {
    #[serde(flatten)]
    pub summary: ExecutionSummary,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub executions: Vec<ListedExecution>,
}

/// The caller's most recent tracked execution.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastExecution {
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub started_at: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct LastExecutionResponse {
    pub execution: Option<LastExecution>,
}

impl From<ExecutionRecord> for LastExecution {
    fn from(record: ExecutionRecord) -> Self {
        Self {
            execution_id: record.external_id,
            status: record.status,
            started_at: record.started_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn trimmed_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|s| s.trim().to_owned()).unwrap_or_default())
}

fn trimmed_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(s)) => s.trim().to_owned(),
        Some(RawId::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

fn validate<T: Validate>(input: &T) -> AppResult<()> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))
}

/// Local user id for a signed-in caller. Callers unknown to the datastore,
/// or a datastore that cannot be reached, yield an anonymous run.
async fn resolve_owner(state: &AppState, user: &AuthUser) -> Option<DbId> {
    match UserRepo::find_by_email(&state.pool, user.email()).await {
        Ok(row) => row.map(|u| u.id),
        Err(e) => {
            tracing::warn!(
                email = %user.email(),
                error = %e,
                "Owner lookup failed, tracking anonymously",
            );
            None
        }
    }
}

/// Read the tracker record for `execution_id`, or `None` if the tracker is
/// unavailable.
async fn tracked_record(state: &AppState, execution_id: &str) -> Option<ExecutionRecord> {
    state
        .tracker
        .get_by_external_id(execution_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(execution_id, error = %e, "Tracker lookup failed");
            None
        })
}

/// Record the engine's terminal status locally.
async fn sync_terminal_status(
    state: &AppState,
    execution_id: &str,
    engine_status: Option<&str>,
    record: Option<&ExecutionRecord>,
) {
    let Some(terminal) = engine_status.and_then(ExecutionStatus::from_engine) else {
        return;
    };
    if !matches!(record, Some(r) if !r.status.is_terminal()) {
        return;
    }
    if let Err(e) = state.tracker.mark_finished(execution_id, terminal).await {
        tracing::warn!(execution_id, error = %e, "Failed to record terminal status");
    }
}

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

/// POST /api/v1/start
///
/// Trigger the workflow through its start webhook and track the new run,
/// storing the caller's body as its payload. The engine's response is
/// relayed as `{ "data": .. }`. Tracking is best-effort: a run the engine
/// accepted is never reported as failed.
pub async fn start_workflow(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> AppResult<Json<DataResponse<Value>>> {
    let body = body.map(|Json(v)| v).unwrap_or_else(|| json!({}));
    let payload = build_start_payload(
        &body,
        user.as_ref().map(AuthUser::email),
        chrono::Utc::now(),
    );

    let response = state.n8n.start_workflow(&payload).await?;
    let started = StartedWorkflow::from_response(&response);

    tracing::info!(
        execution_id = ?started.execution_id,
        started_by = %payload["startedBy"],
        "Workflow started",
    );

    let owner_id = match (&user, &started.execution_id) {
        (Some(user), Some(_)) => resolve_owner(&state, user).await,
        _ => None,
    };
    if let Err(e) = state
        .tracker
        .start_execution(owner_id, body, &started)
        .await
    {
        tracing::warn!(
            execution_id = ?started.execution_id,
            error = %e,
            "Failed to track started execution",
        );
    }

    Ok(Json(DataResponse { data: response }))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /api/v1/execution?executionId=..
///
/// Fetch the run from the engine, extract its content and resume URL, and
/// attach the owner's profile when one is known.
pub async fn get_execution(
    State(state): State<AppState>,
    Query(query): Query<ExecutionQuery>,
) -> AppResult<Json<ExecutionView>> {
    let execution_id = query
        .execution_id
        .map(|id| id.trim().to_owned())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing executionId".into()))?;

    let execution = state.n8n.get_execution(&execution_id).await?;

    let extracted = extract_poems(run_data(&execution));
    let engine_status = execution.get("status").and_then(Value::as_str);

    let record = tracked_record(&state, &execution_id).await;
    sync_terminal_status(&state, &execution_id, engine_status, record.as_ref()).await;

    let resume_url =
        find_resume_url(&execution).or_else(|| record.and_then(|r| r.resume_url));

    let user = ExecutionRepo::find_owner(&state.pool, &execution_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(execution_id = %execution_id, error = %e, "Owner lookup failed");
            None
        })
        .map(UserProfile::from);

    let mut view = ExecutionView {
        status: engine_status.map(str::to_owned),
        finished: execution.get("finished").and_then(Value::as_bool),
        execution_id,
        poems: Vec::new(),
        chapters: None,
        book_html: None,
        book_pdf: None,
        source_node: None,
        resume_url,
        user,
    };
    if let Some(result) = extracted {
        view.poems = result.poems;
        view.chapters = result.chapters;
        view.book_html = result.book_html;
        view.book_pdf = result.book_pdf;
        view.source_node = Some(result.source_node);
    }

    Ok(Json(view))
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// GET /api/v1/executions?workflowId=..&limit=..
///
/// Admin only. Recent runs of the workflow as reported by the engine, each
/// with its owner's profile where the run is tracked locally.
pub async fn list_executions(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ListResponse>> {
    let workflow_id = resolve_workflow_id(
        query.workflow_id.as_deref(),
        state.config.n8n.workflow_id.as_deref(),
    )?;
    let limit = clamp_limit(query.limit);

    let summaries = state.n8n.list_executions(&workflow_id, limit).await?;

    let ids: Vec<String> = summaries.iter().filter_map(|s| s.id.clone()).collect();
    let mut owners: HashMap<String, UserProfile> = if ids.is_empty() {
        HashMap::new()
    } else {
        ExecutionRepo::find_owners(&state.pool, &ids)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Owner lookup for listing failed");
                Vec::new()
            })
            .into_iter()
            .map(|owner| (owner.n8n_execution_id.clone(), owner.into()))
            .collect()
    };

    let executions = summaries
        .into_iter()
        .map(|summary| {
            let user = summary.id.as_ref().and_then(|id| owners.remove(id));
            ListedExecution { summary, user }
        })
        .collect();

    Ok(Json(ListResponse { executions }))
}

/// GET /api/v1/last-execution
///
/// The caller's most recently started run. Always answers 200; anonymous
/// callers and lookup failures yield `{ "execution": null }`.
pub async fn last_execution(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
) -> Json<LastExecutionResponse> {
    let Some(user) = user else {
        return Json(LastExecutionResponse { execution: None });
    };

    let owner = match UserRepo::find_by_email(&state.pool, user.email()).await {
        Ok(owner) => owner,
        Err(e) => {
            tracing::warn!(email = %user.email(), error = %e, "User lookup failed");
            None
        }
    };

    let execution = match owner {
        Some(owner) => state
            .tracker
            .latest_for_owner(owner.id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(user_id = owner.id, error = %e, "Tracker lookup failed");
                None
            }),
        None => None,
    };

    Json(LastExecutionResponse {
        execution: execution.map(LastExecution::from),
    })
}

// ---------------------------------------------------------------------------
// Cancel / resume
// ---------------------------------------------------------------------------

/// POST /api/v1/cancel
///
/// Ask the engine to stop the run and mark it canceled locally. The local
/// update runs even when the engine call fails, unless the engine API is
/// not configured at all. Returns 204 No Content.
pub async fn cancel_execution(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CancelRequest>,
) -> AppResult<StatusCode> {
    validate(&input)?;
    let execution_id = input.execution_id.as_str();

    match state.n8n.cancel_execution(execution_id).await {
        Ok(()) => {}
        Err(e @ N8nError::NotConfigured(_)) => return Err(e.into()),
        // Typically the run already finished upstream.
        Err(e) => tracing::warn!(execution_id, error = %e, "Engine cancel failed"),
    }

    if let Err(e) = state.tracker.mark_canceled(execution_id).await {
        tracing::warn!(execution_id, error = %e, "Failed to record cancellation");
    }

    tracing::info!(execution_id, email = %auth.email(), "Execution canceled");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resume
///
/// Post `data` (or, without it, the whole request body) to the resume URL
/// of a paused run and relay the engine's answer as `{ "data": .. }`.
pub async fn resume_execution(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<DataResponse<Value>>> {
    let input: ResumeRequest = serde_json::from_value(body.clone())
        .map_err(|e| AppError::BadRequest(format!("Invalid resume request: {e}")))?;
    validate(&input)?;

    let forwarded = input.data.unwrap_or(body);
    let response = state.n8n.resume(&input.resume_url, &forwarded).await?;

    tracing::info!(resume_url = %input.resume_url, "Execution resumed");

    Ok(Json(DataResponse { data: response }))
}
