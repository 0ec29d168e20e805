//! Diagnostic command handlers.

pub mod config;
