//! Service configuration
//!
//! Every timeout, the endpoint and the service script name live in one
//! immutable [`ServiceConfig`] that is handed to the supervisor and the client.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default service port
pub const DEFAULT_PORT: u16 = 28123;

/// Default service host (loopback only)
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Script bundled with the plugin that starts the HTTP service
pub const DEFAULT_SERVICE_SCRIPT: &str = "ocr_service.py";

/// Address of the local OCR service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServiceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url())
    }

    pub fn ocr_url(&self) -> String {
        format!("{}/ocr", self.base_url())
    }

    pub fn languages_url(&self) -> String {
        format!("{}/languages", self.base_url())
    }
}

impl Default for ServiceEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

/// Supervisor and client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Overall budget for a freshly launched service to become healthy
    pub startup_timeout_ms: u64,
    /// Budget for a single `/ocr` or `/languages` exchange
    pub request_timeout_ms: u64,
    /// Timeout of the probe that decides whether to launch
    pub initial_probe_timeout_ms: u64,
    /// Timeout of each probe inside the readiness poll loop
    pub poll_probe_timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Script name, resolved against the plugin directory
    pub service_script: String,
    /// Append the service's stdout/stderr here instead of discarding them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_log: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            startup_timeout_ms: 15_000,
            request_timeout_ms: 30_000,
            initial_probe_timeout_ms: 2_000,
            poll_probe_timeout_ms: 1_000,
            poll_interval_ms: 500,
            service_script: DEFAULT_SERVICE_SCRIPT.to_string(),
            service_log: None,
        }
    }
}

impl ServiceConfig {
    /// `<config_dir>/pot-ocr/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pot-ocr").join("config.json"))
    }

    /// Loads a configuration file, or the defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read configuration file: `{}`", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Could not parse configuration file: `{}`", path.display()))?;

        Ok(config)
    }

    /// Applies `POT_OCR_HOST` / `POT_OCR_PORT` overrides.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(host) = std::env::var("POT_OCR_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("POT_OCR_PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("Invalid POT_OCR_PORT: `{}`", port))?;
        }
        Ok(self)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_probe_timeouts(mut self, initial: Duration, poll: Duration) -> Self {
        self.initial_probe_timeout_ms = initial.as_millis() as u64;
        self.poll_probe_timeout_ms = poll.as_millis() as u64;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_service_log(mut self, path: PathBuf) -> Self {
        self.service_log = Some(path);
        self
    }

    pub fn endpoint(&self) -> ServiceEndpoint {
        ServiceEndpoint::new(self.host.clone(), self.port)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn initial_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.initial_probe_timeout_ms)
    }

    pub fn poll_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_probe_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
