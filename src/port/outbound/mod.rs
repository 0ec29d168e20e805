//! Outbound ports: traits for the external systems the orchestrator calls.

pub mod asset;
pub mod backend;
pub mod observer;
