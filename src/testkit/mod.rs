//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`backend`] - [`ScriptedBackend`](backend::ScriptedBackend): queued
//!   responses for every backend call, with call recording.
//! - [`assets`] - [`StaticAssets`](assets::StaticAssets): fixed dimensions
//!   and visual ids.
//! - [`observer`] - [`RecordingObserver`](observer::RecordingObserver).
//! - [`domain`] - Builders for models, node values and run statuses.

pub mod assets;
pub mod backend;
pub mod domain;
pub mod observer;
