// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const PROD: &str = "prod";
#[allow(dead_code)]
pub const DEV: &str = "dev";
#[allow(dead_code)]
pub const TEST: &str = "test";

/// How non-success, non-5xx HTTP responses (3xx/4xx) are classified.
/// The conservative default treats them as an alarm condition rather
/// than total unreachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientErrorPolicy {
    Alarm,
    Down,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Monitor {
    pub monitor: MonitorBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorBox {
    pub env: String,
    pub logs: Option<Logs>,
    pub api: Option<Api>,
    pub checker: Option<Checker>,
    pub registry: Option<RegistryCfg>,
    pub shutdown: Option<Shutdown>,
    /// Services registered automatically at startup, before the first
    /// reconciliation pass.
    pub services: Option<Vec<SeedService>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Api {
    pub name: Option<String>,
    pub port: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Checker {
    #[serde(default, rename = "reconcile_interval", with = "humantime_serde")]
    pub reconcile_interval: Option<Duration>,
    #[serde(default, rename = "probe_timeout", with = "humantime_serde")]
    pub probe_timeout: Option<Duration>,
    #[serde(default, rename = "min_interval", with = "humantime_serde")]
    pub min_interval: Option<Duration>,
    #[serde(default, rename = "default_interval", with = "humantime_serde")]
    pub default_interval: Option<Duration>,
    #[serde(default, rename = "telemetry_interval", with = "humantime_serde")]
    pub telemetry_interval: Option<Duration>,
    #[serde(default, rename = "shutdown_timeout", with = "humantime_serde")]
    pub shutdown_timeout: Option<Duration>,
    #[serde(rename = "client_error_policy")]
    pub client_error_policy: Option<ClientErrorPolicy>,
}

impl Checker {
    pub fn reconcile_interval(&self) -> Duration {
        self.reconcile_interval.unwrap_or(Duration::from_secs(2))
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout.unwrap_or(Duration::from_secs(5))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval.unwrap_or(Duration::from_secs(10))
    }

    pub fn default_interval(&self) -> Duration {
        self.default_interval.unwrap_or(Duration::from_secs(30))
    }

    pub fn telemetry_interval(&self) -> Duration {
        self.telemetry_interval.unwrap_or(Duration::from_secs(60))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout.unwrap_or(Duration::from_secs(10))
    }

    pub fn client_error_policy(&self) -> ClientErrorPolicy {
        self.client_error_policy.unwrap_or(ClientErrorPolicy::Alarm)
    }

    /// Resolves a requested polling interval against the configured
    /// minimum. Values below the minimum (or absent) are silently
    /// clamped up to the default, never rejected. Sub-second precision
    /// of the request is kept.
    pub fn clamp_interval(&self, requested: Option<Duration>) -> Duration {
        match requested {
            Some(interval) if interval >= self.min_interval() => interval,
            _ => self.default_interval(),
        }
    }

    /// `clamp_interval` for the whole-second frequency the HTTP
    /// registration body carries.
    pub fn effective_interval(&self, requested_seconds: Option<u64>) -> Duration {
        self.clamp_interval(requested_seconds.map(Duration::from_secs))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryCfg {
    /// Path of the best-effort JSON snapshot. No persistence when unset.
    #[serde(rename = "snapshot_path")]
    pub snapshot_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Shutdown {
    #[serde(default, rename = "graceful_timeout", with = "humantime_serde")]
    pub graceful_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedService {
    pub name: String,
    pub endpoint: String,
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,
    #[serde(default)]
    pub recipients: Vec<String>,
}

// Config trait
pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    #[allow(dead_code)]
    fn is_test(&self) -> bool;
    fn api(&self) -> Option<&Api>;
    fn checker(&self) -> Checker;
    fn registry(&self) -> Option<&RegistryCfg>;
    fn services(&self) -> &[SeedService];
    fn graceful_timeout(&self) -> Duration;
}

// Config type alias for convenience
pub type Config = Monitor;

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.monitor.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.monitor.env == PROD
    }

    fn is_test(&self) -> bool {
        self.monitor.env == TEST
    }

    fn api(&self) -> Option<&Api> {
        self.monitor.api.as_ref()
    }

    fn checker(&self) -> Checker {
        self.monitor.checker.clone().unwrap_or_default()
    }

    fn registry(&self) -> Option<&RegistryCfg> {
        self.monitor.registry.as_ref()
    }

    fn services(&self) -> &[SeedService] {
        self.monitor.services.as_deref().unwrap_or(&[])
    }

    fn graceful_timeout(&self) -> Duration {
        self.monitor
            .shutdown
            .as_ref()
            .and_then(|s| s.graceful_timeout)
            .unwrap_or(Duration::from_secs(10))
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        let cfg: Monitor = serde_yaml::from_str(&data)
            .with_context(|| format!("unmarshal yaml from {:?}", abs_path))?;

        if cfg.monitor.env.is_empty() {
            anyhow::bail!("monitor.env must not be empty");
        }

        Ok(cfg)
    }
}

// Test config is always available for integration tests
mod test_config;
#[allow(dead_code)]
pub use test_config::new_test_config;
