//! modelrun - generative-model run orchestration.
//!
//! Turns a workflow node's inputs into a backend run request, submits it
//! exactly once, and tracks the resulting jobs until they finish.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] - parameter values, models, requests, statuses, credits
//! - [`port`] - traits for the backend and asset services
//! - [`application`] - normalization, polling, form validation, orchestration
//! - [`adapter`] - the HTTP backend client and the command-line interface
//! - [`infrastructure`] - configuration loading and wiring
//! - [`error`] - error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use modelrun::infrastructure::bootstrap::build_orchestrator;
//! use modelrun::infrastructure::config::Config;
//!
//! # async fn demo() -> modelrun::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let orchestrator = build_orchestrator(&config)?;
//! orchestrator.start_polling("recipe-1", &["run-1".to_string()]).await;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
