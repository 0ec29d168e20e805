//! Backend REST client.
//!
//! Implements [`RunBackend`] and [`AssetService`] over the backend's HTTP API.
//! Submissions and other POSTs are sent exactly once; GET status reads are
//! retried on connect failures, timeouts and 5xx responses.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::ImageFormat;
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::dto::{
    BatchStatusResponse, PredictionStatusResponse, RegisterImageRequest, RegisterImageResponse,
    SubmitRecipeResponse, SubmitRunResponse,
};
use super::settings::BackendConfig;
use crate::domain::{BatchStatus, PredictionStatus, RecipeRunRequest, RunRequest, SubmitOutcome};
use crate::error::{ConfigError, Result, TransportError};
use crate::port::{AssetService, RunBackend};

/// HTTP client for the generation backend.
pub struct HttpBackend {
    http: HttpClient,
    base_url: String,
    api_token: Option<String>,
    read_retries: u32,
    retry_delay: Duration,
}

impl HttpBackend {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base = url::Url::parse(&config.base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "backend.base_url",
                reason: format!("unsupported scheme '{}'", base.scheme()),
            }
            .into());
        }

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
            read_retries: config.read_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request exactly once and decode its JSON body.
    async fn send_once<T>(&self, builder: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.authorized(builder).send().await?;
        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    /// GET with the read retry policy.
    async fn get_with_retry<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let max_attempts = self.read_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let request = self.authorized(self.http.get(&url).query(query));
            let error = match request.send().await {
                Ok(response) => match Self::check_status(response).await {
                    Ok(response) => return Self::decode(response).await,
                    Err(e) => e,
                },
                Err(e) => TransportError::Request(e),
            };

            if attempt >= max_attempts || !Self::should_retry(&error) {
                return Err(error.into());
            }
            warn!(
                attempt,
                max_attempts,
                url = %url,
                error = %error,
                "Status read failed, retrying"
            );
            if !self.retry_delay.is_zero() {
                sleep(self.retry_delay).await;
            }
        }
    }

    fn should_retry(err: &TransportError) -> bool {
        match err {
            TransportError::Request(e) => e.is_timeout() || e.is_connect(),
            TransportError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            TransportError::Decode(_) | TransportError::Aborted => false,
        }
    }

    async fn check_status(
        response: reqwest::Response,
    ) -> std::result::Result<reqwest::Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status { status, body })
    }

    /// Fetch an asset without backend credentials.
    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?;
        Ok(Self::check_status(response).await?.bytes().await?.to_vec())
    }

    async fn decode<T>(response: reqwest::Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::Decode(e.to_string()).into())
    }
}

#[async_trait]
impl RunBackend for HttpBackend {
    async fn submit_run(&self, request: &RunRequest) -> Result<SubmitOutcome> {
        debug!(model = %request.model.descriptor.name, node_id = %request.node_id, "Submitting model run");
        let response: SubmitRunResponse = self
            .send_once(self.http.post(self.url("/v1/models/run")).json(request))
            .await?;
        Ok(SubmitOutcome::Prediction(response.prediction_id))
    }

    async fn submit_recipe(&self, request: &RecipeRunRequest) -> Result<SubmitOutcome> {
        debug!(recipe_id = %request.recipe_id, runs = request.number_of_runs, "Submitting recipe run");
        let path = format!("/v1/recipe-runs/recipes/{}/run", request.recipe_id);
        let response: SubmitRecipeResponse = self
            .send_once(self.http.post(self.url(&path)).json(request))
            .await?;
        Ok(SubmitOutcome::Runs(response.run_ids))
    }

    async fn prediction_status(&self, prediction_id: &str) -> Result<PredictionStatus> {
        let path = format!("/v1/models/predict/{prediction_id}/status");
        let response: PredictionStatusResponse = self.get_with_retry(&path, &[]).await?;
        Ok(response.try_into()?)
    }

    async fn batch_status(&self, recipe_id: &str, run_ids: &[String]) -> Result<BatchStatus> {
        let path = format!("/v1/recipe-runs/recipes/{recipe_id}/runs/status");
        let response: BatchStatusResponse = self
            .get_with_retry(&path, &[("runIds", run_ids.join(","))])
            .await?;
        Ok(response.into())
    }

    async fn cancel_runs(&self, recipe_id: &str) -> Result<()> {
        let path = format!("/v1/recipe-runs/recipes/{recipe_id}/runs/cancel");
        let response = self
            .authorized(self.http.post(self.url(&path)))
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl AssetService for HttpBackend {
    async fn image_dimensions(&self, url: &str) -> Result<(u32, u32)> {
        let bytes = self.fetch_asset(url).await?;
        let dimensions = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(dimensions)
    }

    async fn register_visual(&self, url: &str) -> Result<String> {
        let response: RegisterImageResponse = self
            .send_once(
                self.http
                    .post(self.url("/v1/models/image/register"))
                    .json(&RegisterImageRequest { url }),
            )
            .await?;
        Ok(response.visual_id)
    }

    async fn negate_mask(&self, url: &str) -> Result<String> {
        let bytes = self.fetch_asset(url).await?;
        let mut mask = image::load_from_memory(&bytes)
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        // Inverts colour channels only; alpha is kept.
        mask.invert();

        let mut png = Cursor::new(Vec::new());
        mask.write_to(&mut png, ImageFormat::Png)
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        debug!(url, bytes = png.get_ref().len(), "Inverted inpainting mask");
        Ok(format!("data:image/png;base64,{}", BASE64.encode(png.get_ref())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = BackendConfig {
            base_url: "https://api.example.com/".into(),
            ..BackendConfig::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(
            backend.url("/v1/models/run"),
            "https://api.example.com/v1/models/run"
        );
    }

    #[test]
    fn rejects_non_http_scheme() {
        let config = BackendConfig {
            base_url: "ftp://example.com".into(),
            ..BackendConfig::default()
        };
        assert!(HttpBackend::new(&config).is_err());
    }

    #[test]
    fn blank_token_is_ignored() {
        let config = BackendConfig {
            api_token: Some(String::new()),
            ..BackendConfig::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert!(backend.api_token.is_none());
    }

    #[test]
    fn retry_policy_covers_server_errors_only() {
        let server = TransportError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: String::new(),
        };
        let client = TransportError::Status {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert!(HttpBackend::should_retry(&server));
        assert!(!HttpBackend::should_retry(&client));
        assert!(!HttpBackend::should_retry(&TransportError::Decode("x".into())));
    }
}
