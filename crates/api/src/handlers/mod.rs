//! Request handlers.
//!
//! Handlers stay thin: workflow-engine payloads go through
//! `mypoems_core::extraction`, tracking through the
//! [`ExecutionTracker`](mypoems_core::tracker::ExecutionTracker) in
//! [`AppState`](crate::state::AppState), and errors are mapped via
//! [`AppError`](crate::error::AppError).

pub mod auth;
pub mod execution;
