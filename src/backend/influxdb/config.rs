use std::time::Duration;
use url::Url;

use crate::error::{AppError, AppResult};

pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Standard port of the InfluxDB HTTP API
pub const DEFAULT_PORT: u16 = 8086;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for an InfluxDB administrative endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluxConnectionConfig {
    /// Hostname or IP address (IPv6 literals without brackets are accepted)
    pub host: String,

    pub port: u16,

    /// Per-request timeout in seconds, covering connect and response
    pub timeout_secs: u64,
}

impl Default for InfluxConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl InfluxConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Root URL of the HTTP API, e.g. `http://127.0.0.1:8086/`
    pub fn base_url(&self) -> AppResult<Url> {
        if self.host.is_empty() {
            return Err(AppError::Configuration("InfluxDB host must not be empty".to_string()));
        }

        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        Url::parse(&format!("http://{}:{}/", host, self.port)).map_err(|e| {
            AppError::Configuration(format!("Invalid InfluxDB address {}: {}", self.host, e))
        })
    }

    /// Administrative and data query endpoint
    pub fn query_url(&self) -> AppResult<Url> {
        self.endpoint("query")
    }

    /// Liveness endpoint
    pub fn ping_url(&self) -> AppResult<Url> {
        self.endpoint("ping")
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url()?
            .join(path)
            .map_err(|e| AppError::Configuration(format!("Invalid endpoint {}: {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InfluxConnectionConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8086);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.query_url().unwrap().as_str(), "http://127.0.0.1:8086/query");
    }

    #[test]
    fn test_ipv6_host_is_bracketed() {
        let config = InfluxConnectionConfig::new("::1", 9999);
        assert_eq!(config.ping_url().unwrap().as_str(), "http://[::1]:9999/ping");
    }

    #[test]
    fn test_hostname_and_timeout() {
        let config = InfluxConnectionConfig::new("influxdb.internal", 8086).with_timeout(5);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(
            config.query_url().unwrap().as_str(),
            "http://influxdb.internal:8086/query"
        );
    }

    #[test]
    fn test_empty_host_is_rejected() {
        let config = InfluxConnectionConfig::new("", 8086);
        assert!(matches!(config.base_url(), Err(AppError::Configuration(_))));
    }
}
