//! Adapters connecting the application to the outside world.
//!
//! - [`inbound`] - the command-line interface
//! - [`outbound`] - the backend HTTP client

pub mod inbound;
pub mod outbound;
