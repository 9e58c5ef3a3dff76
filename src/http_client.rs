use crate::error::ValidationError;
use futures::TryStreamExt;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Configuration for the schema download client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Number of retry attempts
    pub retry_attempts: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds (for exponential backoff cap)
    pub max_retry_delay_ms: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            max_retry_delay_ms: 30000,
            user_agent: format!("ern-validate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Async HTTP client used by bootstrap mode to fetch DDEX schema files
pub struct AsyncHttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl AsyncHttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, ValidationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(ValidationError::from)?;

        Ok(Self { client, config })
    }

    /// Downloads a schema document, retrying transient failures with exponential backoff.
    ///
    /// The body is streamed so that `progress` sees every chunk as it arrives.
    pub async fn fetch<F>(&self, url: &str, mut progress: F) -> Result<Vec<u8>, ValidationError>
    where
        F: FnMut(u64, Option<u64>) + Send,
    {
        let response = self.get_response_with_retry(url).await?;

        let total_size = response.content_length();
        let mut downloaded = 0u64;
        let mut buffer = Vec::with_capacity(total_size.unwrap_or(0) as usize);
        progress(0, total_size);

        let mut stream = response.bytes_stream();
        while let Some(chunk) = TryStreamExt::try_next(&mut stream)
            .await
            .map_err(ValidationError::from)?
        {
            buffer.extend_from_slice(&chunk);
            downloaded += chunk.len() as u64;
            progress(downloaded, total_size);
        }

        debug!(url, bytes = downloaded, "schema downloaded");
        Ok(buffer)
    }

    async fn get_response_with_retry(&self, url: &str) -> Result<Response, ValidationError> {
        let mut attempt = 0;

        loop {
            let error = match self.make_request(url).await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let error = ValidationError::HttpStatus {
                        url: url.to_string(),
                        status: status.as_u16(),
                        message: format!(
                            "HTTP {}: {}",
                            status.as_u16(),
                            status.canonical_reason().unwrap_or("Unknown")
                        ),
                    };
                    // 4xx is final
                    if !status.is_server_error() {
                        return Err(error);
                    }
                    error
                }
                Err(error) if Self::is_retryable_error(&error) => error,
                Err(error) => return Err(error),
            };

            if attempt >= self.config.retry_attempts {
                return Err(error);
            }
            warn!(url, attempt, error = %error, "schema download failed, retrying");
            self.wait_before_retry(attempt).await;
            attempt += 1;
        }
    }

    async fn make_request(&self, url: &str) -> Result<Response, ValidationError> {
        timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.client.get(url).send(),
        )
        .await
        .map_err(|_| ValidationError::Timeout {
            url: url.to_string(),
            timeout_seconds: self.config.timeout_seconds,
        })?
        .map_err(ValidationError::from)
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self
            .config
            .retry_delay_ms
            .saturating_mul(2_u64.saturating_pow(attempt));
        Duration::from_millis(delay_ms.min(self.config.max_retry_delay_ms))
    }

    async fn wait_before_retry(&self, attempt: u32) {
        sleep(self.retry_delay(attempt)).await;
    }

    fn is_retryable_error(error: &ValidationError) -> bool {
        match error {
            ValidationError::Http(reqwest_error) => {
                reqwest_error.is_timeout() || reqwest_error.is_connect() || reqwest_error.is_request()
            }
            ValidationError::Timeout { .. } => true,
            _ => false,
        }
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}
