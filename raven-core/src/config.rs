use crate::error::{Error, Result};
use crate::scoring::ScoringWeights;
use crate::types::{LinkKey, NodeId};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path, time::Duration};

/// Connection settings for the SDN controller REST API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    /// Base URL, e.g. `http://onos:8181`.
    pub url: String,
    /// Basic-auth user.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Timeout applied to every request.
    pub request_timeout_ms: u64,
    /// Priority of installed flow rules.
    pub flow_priority: u32,
    /// Output port used when the topology does not know the egress port.
    pub default_output_port: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            url: "http://onos:8181".into(),
            username: "onos".into(),
            password: "rocks".into(),
            request_timeout_ms: 5_000,
            flow_priority: 40_000,
            default_output_port: "1".into(),
        }
    }
}

impl ControllerConfig {
    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Monitoring loop cadence and candidate count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Candidate paths considered per host pair (k).
    pub candidate_paths: usize,
    /// Sleep after a completed cycle.
    pub cycle_interval_secs: u64,
    /// Sleep after a failed inventory fetch.
    pub fetch_backoff_secs: u64,
    /// Delay before the first cycle, giving the controller time to start.
    pub startup_delay_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            candidate_paths: 3,
            cycle_interval_secs: 10,
            fetch_backoff_secs: 15,
            startup_delay_secs: 30,
        }
    }
}

impl MonitorConfig {
    /// Cycle sleep as a duration.
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    /// Fetch-failure sleep as a duration.
    pub fn fetch_backoff(&self) -> Duration {
        Duration::from_secs(self.fetch_backoff_secs)
    }

    /// Startup delay as a duration.
    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }
}

/// Known capacity of one link, used when the link is first observed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkCapacity {
    /// One endpoint.
    pub a: NodeId,
    /// The other endpoint.
    pub b: NodeId,
    /// Capacity in Mbps.
    pub bandwidth_mbps: f64,
}

/// Top-level configuration, loaded from TOML. Every section is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RavenConfig {
    /// Tracing level used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Controller connection.
    pub controller: ControllerConfig,
    /// Score weights.
    pub scoring: ScoringWeights,
    /// Loop cadence.
    pub monitor: MonitorConfig,
    /// Per-link capacity hints.
    pub link_capacity: Vec<LinkCapacity>,
}

impl Default for RavenConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            controller: ControllerConfig::default(),
            scoring: ScoringWeights::default(),
            monitor: MonitorConfig::default(),
            link_capacity: Vec::new(),
        }
    }
}

impl RavenConfig {
    /// Read, parse and validate a TOML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_toml(&data)
    }

    /// Parse and validate TOML text; an empty document yields the defaults.
    pub fn from_toml(data: &str) -> Result<Self> {
        let cfg: Self =
            toml::from_str(data).map_err(|e| Error::config(format!("toml parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `RAVEN_*` environment overrides and re-validate.
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(v) = std::env::var("RAVEN_CONTROLLER_URL") {
            self.controller.url = v;
        }
        if let Ok(v) = std::env::var("RAVEN_CONTROLLER_USER") {
            self.controller.username = v;
        }
        if let Ok(v) = std::env::var("RAVEN_CONTROLLER_PASSWORD") {
            self.controller.password = v;
        }
        if let Ok(v) = std::env::var("RAVEN_LOG_LEVEL") {
            self.log_level = v;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let allowed = ["trace", "debug", "info", "warn", "error"];
        if !allowed.contains(&self.log_level.as_str()) {
            return Err(Error::config(format!("invalid log_level: {}", self.log_level)));
        }
        let url = &self.controller.url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::config(format!("controller.url must be http(s): {url}")));
        }
        if self.controller.request_timeout_ms == 0 {
            return Err(Error::config("controller.request_timeout_ms must be > 0"));
        }
        let w = &self.scoring;
        if ![w.alpha, w.beta, w.gamma].iter().all(|v| v.is_finite()) {
            return Err(Error::config("scoring weights must be finite"));
        }
        if !(w.bandwidth_ref.is_finite() && w.bandwidth_ref > 0.0) {
            return Err(Error::config("scoring.bandwidth_ref must be > 0"));
        }
        if self.monitor.candidate_paths == 0 {
            return Err(Error::config("monitor.candidate_paths must be >= 1"));
        }
        for cap in &self.link_capacity {
            if !(cap.bandwidth_mbps.is_finite() && cap.bandwidth_mbps > 0.0) {
                return Err(Error::config(format!(
                    "link_capacity {}-{}: bandwidth_mbps must be > 0",
                    cap.a, cap.b
                )));
            }
        }
        Ok(())
    }

    /// Capacity hints keyed by canonical link key.
    pub fn capacity_hints(&self) -> HashMap<LinkKey, f64> {
        self.link_capacity
            .iter()
            .map(|c| (LinkKey::new(c.a.as_str(), c.b.as_str()), c.bandwidth_mbps))
            .collect()
    }
}
