//! Backend-agnostic types for model runs.
//!
//! - [`value`] - node parameter values ([`ParameterValue`])
//! - [`model`] - model descriptors and type resolution
//! - [`request`] - run requests and submission outcomes
//! - [`status`] - prediction and batch run statuses
//! - [`credits`] - credit balances
//! - [`error`] - normalization and form validation errors

pub mod credits;
pub mod error;
pub mod model;
pub mod request;
pub mod status;
pub mod value;

pub use credits::{Credits, CreditsUpdate};
pub use model::{ModelDescriptor, ModelService, ModelType};
pub use request::{
    Handle, InputHandles, NodeInputs, NodeParams, RecipeInput, RecipeRunRequest, RequestModel,
    RunRequest, SubmitOutcome,
};
pub use status::{
    error_message, BatchStatus, PredictionStatus, RunRecord, RunResult, RunState, RunStatus,
};
pub use value::{Asset, AssetKind, ParameterValue, Seed};
