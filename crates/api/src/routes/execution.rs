//! Route definitions for workflow executions.
//!
//! Starting, status, and resume work without a session; cancel requires
//! one and the listing requires the admin account.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::execution;
use crate::state::AppState;

/// Execution routes mounted at the API root.
///
/// ```text
/// POST   /start           -> start_workflow
/// GET    /execution       -> get_execution
/// GET    /executions      -> list_executions
/// GET    /last-execution  -> last_execution
/// POST   /cancel          -> cancel_execution
/// POST   /resume          -> resume_execution
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(execution::start_workflow))
        .route("/execution", get(execution::get_execution))
        .route("/executions", get(execution::list_executions))
        .route("/last-execution", get(execution::last_execution))
        .route("/cancel", post(execution::cancel_execution))
        .route("/resume", post(execution::resume_execution))
}
