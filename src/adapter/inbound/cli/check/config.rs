use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::settings::{Config, API_TOKEN_ENV};

/// Validate a configuration file without contacting the backend.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    let config = Config::load(path)?;

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration file is valid");

    output::section("Backend");
    output::field("Base URL", &config.backend.base_url);
    output::field("Timeout", format!("{}s", config.backend.request_timeout_secs));
    output::field("Read retries", config.backend.read_retries);
    if config.backend.api_token.is_some() {
        output::success("API token configured");
    } else {
        output::warning(&format!(
            "API token not configured (set {API_TOKEN_ENV} or backend.api_token)"
        ));
    }

    output::section("Polling");
    output::field("Interval", format!("{}ms", config.polling.batch_interval_ms));
    output::field("Retries", config.polling.max_retry_attempts);
    output::field("Pixel budget", config.polling.pixel_budget);

    output::section("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", format!("{:?}", config.logging.format).to_lowercase());

    output::success("Configuration check complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn valid_file_passes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[polling]\nbatch_interval_ms = 500").unwrap();
        assert!(execute_config(file.path()).is_ok());
    }

    #[test]
    fn missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(execute_config(dir.path().join("absent.toml")).is_err());
    }
}
