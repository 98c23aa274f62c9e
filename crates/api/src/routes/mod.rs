pub mod auth;
pub mod execution;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      sync user after sign-in (POST)
/// /me                                              current session (GET)
///
/// /start                                           start the workflow (POST)
/// /execution?executionId=                          status + extracted content (GET)
/// /executions?workflowId=&limit=                   engine listing (GET, admin only)
/// /last-execution                                  caller's latest run (GET)
/// /cancel                                          cancel a run (POST)
/// /resume                                          resume a paused run (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Session-backed user routes.
        .nest("/auth", auth::router())
        .merge(auth::session_router())
        // Workflow execution routes.
        .merge(execution::router())
}
