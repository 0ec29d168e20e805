//! Application services (use cases).
//!
//! These services combine domain types with the outbound ports to turn a
//! node's inputs into a tracked backend run.
//!
//! - [`normalize`] - node inputs to request input, model rewrite rules
//! - [`poll`] - single-prediction poller and batch polling sessions
//! - [`validation`] - recipe form validation
//! - [`state`] - caller-observable results, credits and snapshot
//! - [`orchestrator`] - single-flight run entry point

pub mod normalize;
pub mod orchestrator;
pub mod poll;
pub mod state;
pub mod validation;

pub use orchestrator::{RunOrchestrator, RunTarget};
pub use state::{PollingSnapshot, RunStore};
