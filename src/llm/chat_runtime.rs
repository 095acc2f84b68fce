use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::llm::error::{Service, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub timeout_secs: Option<u64>,
    pub retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            retries: 0,
            retry_delay_ms: 500,
        }
    }
}

/// Posts `payload` as JSON with bearer auth, retrying throttling, server
/// errors and transient transport failures.
pub(crate) async fn post_json_with_retry<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    service: Service,
    url: &str,
    api_key: &str,
    payload: &T,
    config: RetryConfig,
) -> Result<reqwest::Response, ServiceError> {
    let max_attempts = config.retries.saturating_add(1);
    let mut attempt = 0;

    loop {
        let mut request = client.post(url).bearer_auth(api_key).json(payload);

        if let Some(timeout_secs) = config.timeout_secs {
            request = request.timeout(Duration::from_secs(timeout_secs));
        }

        match request.send().await {
            Ok(response) => {
                if response.status().is_success() {
                    return Ok(response);
                }

                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let can_retry = is_retryable_status(status) && attempt + 1 < max_attempts;

                if can_retry {
                    tracing::debug!(service = %service, %status, attempt, "retrying request");
                    sleep(retry_delay(attempt, config.retry_delay_ms)).await;
                    attempt += 1;
                    continue;
                }

                return Err(ServiceError::Api {
                    service,
                    status,
                    body,
                });
            }
            Err(source) => {
                let can_retry = is_retryable_request_error(&source) && attempt + 1 < max_attempts;

                if can_retry {
                    tracing::debug!(service = %service, error = %source, attempt, "retrying request");
                    sleep(retry_delay(attempt, config.retry_delay_ms)).await;
                    attempt += 1;
                    continue;
                }

                return Err(ServiceError::Request { service, source });
            }
        }
    }
}

/// Reads the whole body and decodes it as JSON. Transport failures are
/// request errors; a body that does not decode is malformed.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: Service,
    response: reqwest::Response,
) -> Result<T, ServiceError> {
    let body = response
        .bytes()
        .await
        .map_err(|source| ServiceError::Request { service, source })?;
    decode_body(service, &body)
}

fn decode_body<T: DeserializeOwned>(service: Service, body: &[u8]) -> Result<T, ServiceError> {
    serde_json::from_slice(body).map_err(|err| ServiceError::Malformed {
        service,
        detail: err.to_string(),
    })
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_request_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

fn retry_delay(attempt: u32, base_ms: u64) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    let delay_ms = base_ms.saturating_mul(factor).min(30_000);
    Duration::from_millis(delay_ms)
}
