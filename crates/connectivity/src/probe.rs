use std::time::{Duration, Instant};

use thiserror::Error;
use url::Url;

use crate::config::{ConfigError, MonitorConfig, ProbeMethod};

/// Why a reachability probe did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("probe returned status code {0}")]
    Status(u16),
    #[error("probe request failed: {0}")]
    Request(String),
}

/// A completed, successful probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSuccess {
    pub latency_ms: u64,
    pub status_code: Option<u16>,
}

/// Bounded-time reachability check against the API
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self) -> Result<ProbeSuccess, ProbeError>;
}

/// HTTP reachability probe
pub struct HttpProbe {
    client: reqwest::Client,
    url: Url,
    method: ProbeMethod,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(url: Url, method: ProbeMethod, timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        Ok(Self { client, url, method, timeout })
    }

    pub fn from_config(config: &MonitorConfig) -> Result<Self, ConfigError> {
        let url = config.health_url()?;
        Self::new(url, config.probe_method, config.probe_timeout())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait::async_trait]
impl Probe for HttpProbe {
    async fn probe(&self) -> Result<ProbeSuccess, ProbeError> {
        let start = Instant::now();

        let request = match self.method {
            ProbeMethod::Get => self.client.get(self.url.clone()),
            ProbeMethod::Head => self.client.head(self.url.clone()),
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout(self.timeout)
            } else {
                ProbeError::Request(e.to_string())
            }
        })?;

        let latency_ms = start.elapsed().as_millis() as u64;
        let status = response.status();

        // Consider 2xx and 3xx as success
        if status.is_success() || status.is_redirection() {
            tracing::debug!(url = %self.url, latency_ms, status = status.as_u16(), "API probe succeeded");
            Ok(ProbeSuccess { latency_ms, status_code: Some(status.as_u16()) })
        } else {
            Err(ProbeError::Status(status.as_u16()))
        }
    }
}
