//! HTTP adapter for the generation backend.
//!
//! - [`client`] - [`HttpBackend`], implementing the backend and asset ports
//! - [`dto`] - wire shapes and their domain conversions
//! - [`settings`] - [`BackendConfig`]

pub mod client;
pub mod dto;
pub mod settings;

pub use client::HttpBackend;
pub use settings::BackendConfig;
