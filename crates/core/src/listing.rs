//! Parameters for execution listings.

use crate::error::CoreError;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_LIST_LIMIT: i64 = 20;

/// Largest page size the engine is asked for.
pub const MAX_LIST_LIMIT: i64 = 100;

/// Clamp a requested page size into `1..=MAX_LIST_LIMIT`.
pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT)
}

/// Pick the workflow to list: the explicit query value, else the configured
/// default. Blank values count as absent.
pub fn resolve_workflow_id(
    requested: Option<&str>,
    configured: Option<&str>,
) -> Result<String, CoreError> {
    [requested, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|id| !id.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            CoreError::Validation(
                "Missing workflowId (query param or N8N_WORKFLOW_ID env var)".into(),
            )
        })
}
