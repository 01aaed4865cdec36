use crate::config::ResolvedConfig;
use crate::constants::{ACCEPT_LANGUAGE, USER_AGENT};
use crate::errors::{AppError, AppResult};
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, warn};

pub const ACCEPT_JSON: &str = "application/json";
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Extracts HTTP status code from error message if present.
///
/// Looks for the pattern "HTTP {status_code}:" in the error message.
fn extract_status_code(msg: &str) -> Option<u16> {
    let prefix = "HTTP ";
    let start = msg.find(prefix)? + prefix.len();
    let end = msg[start..].find(':').unwrap_or(msg[start..].len());
    msg[start..start + end].trim().parse().ok()
}

/// Network failures without a status and 5xx responses are retried; 4xx and
/// everything that is not a network error are not.
pub(crate) fn should_retry(error: &AppError) -> bool {
    match error {
        AppError::NetworkError(msg) => match extract_status_code(msg) {
            Some(status_code) => status_code >= 500,
            None => !msg.contains("client error"),
        },
        _ => false,
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 10000,
        }
    }
}

impl From<&ResolvedConfig> for RetryConfig {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay_ms: config.retry_initial_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

/// Calculates exponential backoff delay in milliseconds.
///
/// Formula: `min(initial_delay * 2^attempt, max_delay)`
pub(crate) fn calculate_backoff(attempt: u32, config: &RetryConfig) -> u64 {
    let delay = config
        .initial_delay_ms
        .saturating_mul(2_u64.saturating_pow(attempt));
    delay.min(config.max_delay_ms)
}

/// Shared HTTP client for the grant sources.
///
/// Sends the application user agent and Spanish `Accept-Language`, applies the
/// per-request timeout, and retries transient failures with exponential backoff.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    retry: RetryConfig,
    request_delay: Duration,
}

impl HttpFetcher {
    pub fn from_config(config: &ResolvedConfig) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::NetworkError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            retry: RetryConfig::from(config),
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    /// Pause between consecutive requests to the same site.
    pub async fn pause(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }

    /// GETs `url` and returns the body as text, retrying transient failures.
    pub async fn get_text(&self, url: &str, accept: &str) -> AppResult<String> {
        let mut last_error: Option<AppError> = None;

        for attempt in 0..=self.retry.max_retries {
            match self.get_text_once(url, accept).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    if attempt < self.retry.max_retries && should_retry(&e) {
                        let delay_ms = calculate_backoff(attempt, &self.retry);
                        warn!(
                            url = url,
                            attempt = attempt + 1,
                            max_retries = self.retry.max_retries + 1,
                            delay_ms = delay_ms,
                            error = %e,
                            "Retrying request after error"
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::NetworkError(format!(
                "Request to {url} failed after {} attempts (no error recorded)",
                self.retry.max_retries + 1
            ))
        }))
    }

    async fn get_text_once(&self, url: &str, accept: &str) -> AppResult<String> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, accept)
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("Failed to fetch {url}: {e}")))?;

        let status = response.status();
        let response = response.error_for_status().map_err(|e| {
            AppError::NetworkError(format!("HTTP {}: Failed to fetch {url}: {e}", status.as_u16()))
        })?;

        let body = response.text().await?;
        debug!(url = url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}
