//! REST and webhook client for the n8n workflow engine.
//!
//! Wraps the engine's public API (execution status, cancellation, listing)
//! and the two URL-addressed entry points a workflow exposes: the start
//! webhook and the per-execution resume URL.

pub mod api;
pub mod config;
pub mod summary;

pub use api::{N8nApi, N8nError};
pub use config::N8nConfig;
pub use summary::ExecutionSummary;
