use std::sync::Arc;

use mypoems_core::tracker::ExecutionTracker;
use mypoems_n8n::N8nApi;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (user lookups, health).
    pub pool: mypoems_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Execution tracker over the injected execution store.
    pub tracker: ExecutionTracker,
    /// Workflow engine client.
    pub n8n: Arc<N8nApi>,
}
