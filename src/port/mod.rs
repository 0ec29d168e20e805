//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems (the generation backend, asset storage).
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │  normalize / poll / run │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     ▼                                                       ▼
//! ┌─────────┐                                          ┌───────────┐
//! │ Backend │                                          │  Assets   │
//! │ Adapter │                                          │  Adapter  │
//! └─────────┘                                          └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`RunBackend`] - Run submission, status reads and cancellation
//! - [`AssetService`] - Image dimension probes and visual-id registration
//! - [`PredictionObserver`] - Callbacks for a single polled prediction

pub mod outbound;

pub use outbound::asset::AssetService;
pub use outbound::backend::RunBackend;
pub use outbound::observer::{NoopObserver, PredictionObserver};
