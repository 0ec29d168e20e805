//! Job tracking: one prediction at a time, or a batch of recipe runs.

pub mod batch;
pub mod prediction;

pub use batch::{BatchPollConfig, BatchPollSession, SessionEnd, TickOutcome};
pub use prediction::{poll_interval, PredictionOutcome, PredictionPoller};
