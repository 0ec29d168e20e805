use thiserror::Error;

use crate::domain::error::{FieldError, NormalizeError};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failures talking to the backend.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("request aborted")]
    Aborted,
}

/// Field-scoped validation failures, in form order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} field(s) need attention", .0.len())]
pub struct ValidationErrors(pub Vec<(String, FieldError)>);

impl ValidationErrors {
    /// The field the caller should focus first.
    #[must_use]
    pub fn first_field(&self) -> Option<&str> {
        self.0.first().map(|(field, _)| field.as_str())
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<FieldError> {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, err)| *err)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("a run is already in progress")]
    RunInFlight,

    #[error("run failed: {0}")]
    RunFailed(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::Request(err))
    }
}

impl Error {
    /// True when the error came from an aborted request rather than a failure.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Transport(TransportError::Aborted))
    }
}
