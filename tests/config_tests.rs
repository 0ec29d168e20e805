//! Loading configuration files from disk.

use std::io::Write;

use tempfile::NamedTempFile;
use tokio_test::{assert_err, assert_ok};

use modelrun::error::{ConfigError, Error};
use modelrun::infrastructure::config::{Config, LogFormat};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_every_section_from_disk() {
    let file = write_config(
        r#"
[backend]
base_url = "https://api.example.com"
request_timeout_secs = 60
read_retries = 4

[polling]
batch_interval_ms = 2000
max_retry_attempts = 5
pixel_budget = 16000000

[logging]
level = "debug"
format = "json"
"#,
    );

    let config = assert_ok!(Config::load(file.path()));

    assert_eq!(config.backend.base_url, "https://api.example.com");
    assert_eq!(config.backend.request_timeout_secs, 60);
    assert_eq!(config.backend.read_retries, 4);
    assert_eq!(config.backend.connect_timeout_ms, 5000);
    assert_eq!(config.polling.batch_interval_ms, 2000);
    assert_eq!(config.polling.max_retry_attempts, 5);
    assert_eq!(config.polling.pixel_budget, 16_000_000);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);

    let batch = config.polling.batch();
    assert_eq!(batch.interval.as_millis(), 2000);
    assert_eq!(batch.max_retry_attempts, 5);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = assert_err!(Config::load(dir.path().join("absent.toml")));
    assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
}

#[test]
fn invalid_values_are_reported_by_field() {
    let file = write_config("[polling]\nmax_retry_attempts = 0\n");
    let err = assert_err!(Config::load(file.path()));
    assert!(matches!(
        err,
        Error::Config(ConfigError::InvalidValue {
            field: "polling.max_retry_attempts",
            ..
        })
    ));
}

#[test]
fn environment_token_overrides_file() {
    let file = write_config("[backend]\napi_token = \"from-file\"\n");

    std::env::set_var("MODELRUN_API_TOKEN", "from-env");
    let overridden = Config::load(file.path());
    std::env::set_var("MODELRUN_API_TOKEN", "   ");
    let blank = Config::load(file.path());
    std::env::remove_var("MODELRUN_API_TOKEN");

    assert_eq!(
        assert_ok!(overridden).backend.api_token.as_deref(),
        Some("from-env")
    );
    assert_eq!(
        assert_ok!(blank).backend.api_token.as_deref(),
        Some("from-file")
    );
}
