//! Infrastructure configuration modules.

pub mod logging;
pub mod polling;
pub mod settings;

pub use crate::adapter::outbound::http::settings::BackendConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use polling::PollingConfig;
pub use settings::Config;
