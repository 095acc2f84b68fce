use reqwest::StatusCode;
use thiserror::Error;

/// Remote services the designer talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Chat,
    Tools,
}

impl Service {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Tools => "tools",
        }
    }

    /// Environment variable holding the service's bearer token.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::Chat => "OPENAI_API_KEY",
            Self::Tools => "TOOLHOUSE_API_KEY",
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{key_env} is not set in the environment")]
    MissingApiKey {
        service: Service,
        key_env: &'static str,
    },
    #[error("{service} request failed: {source}")]
    Request {
        service: Service,
        source: reqwest::Error,
    },
    #[error("{service} API error {status}: {body}")]
    Api {
        service: Service,
        status: StatusCode,
        body: String,
    },
    #[error("{service} response was malformed: {detail}")]
    Malformed { service: Service, detail: String },
}

/// Reads a service's API key, treating blank values as missing.
pub fn api_key(service: Service) -> Result<String, ServiceError> {
    let key_env = service.api_key_env();
    std::env::var(key_env)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ServiceError::MissingApiKey { service, key_env })
}

pub fn is_api_key_present(service: Service) -> bool {
    api_key(service).is_ok()
}
