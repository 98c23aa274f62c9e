//! Domain logic for the poem-generation workflow backend.
//!
//! Nothing in this crate performs I/O. The datastore is reached through the
//! [`tracker::ExecutionStore`] trait and workflow-engine payloads arrive as
//! plain [`serde_json::Value`] trees.

pub mod error;
pub mod extraction;
pub mod listing;
pub mod start;
pub mod status;
pub mod tracker;
pub mod types;
