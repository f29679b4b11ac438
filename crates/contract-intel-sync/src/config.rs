//! Connection and polling settings for the contract service.

use std::time::Duration;

use crate::error::ServiceError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ClientConfig {
    /// Settings for the service at `base_url`, e.g. `http://localhost:8000`.
    ///
    /// Trailing slashes are dropped. The URL must carry an http(s) scheme.
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ServiceError::Validation(
                "service URL must not be empty".into(),
            ));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ServiceError::Validation(format!(
                "service URL must start with http:// or https://, got {base_url}"
            )));
        }
        Ok(Self {
            base_url: base_url.to_string(),
            ..Self::default()
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Result<Self, ServiceError> {
        if interval.is_zero() {
            return Err(ServiceError::Validation(
                "poll interval must be greater than zero".into(),
            ));
        }
        self.poll_interval = interval;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
