// src/config.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

const ENV_CONFIG_PATH: &str = "MONITOR_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";

pub const DEFAULT_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/TribecaHQ/tribeca-registry-build/master/registry/governor-metas.mainnet.json";

/// Which diff family this deployment runs. Chosen once at startup; no
/// runtime mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffStrategy {
    /// Watch the scalar proposal count and fetch only the new index range.
    Threshold,
    /// Watch the set of proposal keys; new keys are `current \ previous`.
    SetAdd,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub registry_url: String,
    /// Governance RPC gateway base URL (governor reads, proposal details).
    pub gateway_url: String,
    pub poll_interval: Duration,
    /// Budget for one governor's whole cycle; expiry counts as a read
    /// failure, never a crash.
    pub source_timeout: Duration,
    pub max_concurrent_sources: usize,
    /// Fan-out bound for per-proposal detail fetches against the gateway.
    pub max_in_flight_details: usize,
    pub threshold: u64,
    pub strategy: DiffStrategy,
    /// Whole-message cap, in chars, applied after rendering.
    pub max_message_len: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            gateway_url: "http://127.0.0.1:8899".to_string(),
            poll_interval: Duration::from_secs(5),
            source_timeout: Duration::from_secs(30),
            max_concurrent_sources: 8,
            max_in_flight_details: 16,
            threshold: 1,
            strategy: DiffStrategy::Threshold,
            max_message_len: 250,
        }
    }
}

/// Optional TOML overrides; every field may be omitted.
#[derive(Debug, Default, Deserialize)]
struct FileOverrides {
    registry_url: Option<String>,
    gateway_url: Option<String>,
    poll_interval_secs: Option<u64>,
    source_timeout_secs: Option<u64>,
    max_concurrent_sources: Option<usize>,
    max_in_flight_details: Option<usize>,
    threshold: Option<u64>,
    strategy: Option<DiffStrategy>,
    max_message_len: Option<usize>,
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

impl MonitorConfig {
    /// Layering: built-in defaults, then the TOML file (if present), then
    /// env vars. Lookup order for the file:
    /// 1) $MONITOR_CONFIG_PATH (must exist if set)
    /// 2) config/monitor.toml
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            anyhow::ensure!(
                pb.exists(),
                "MONITOR_CONFIG_PATH points to non-existent path"
            );
            cfg.apply_file(&pb)?;
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                cfg.apply_file(&default_p)?;
            }
        }

        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading monitor config from {}", path.display()))?;
        let ov: FileOverrides = toml::from_str(&content)
            .with_context(|| format!("parsing monitor config {}", path.display()))?;

        if let Some(v) = ov.registry_url {
            self.registry_url = v;
        }
        if let Some(v) = ov.gateway_url {
            self.gateway_url = v;
        }
        if let Some(v) = ov.poll_interval_secs {
            self.poll_interval = Duration::from_secs(v);
        }
        if let Some(v) = ov.source_timeout_secs {
            self.source_timeout = Duration::from_secs(v);
        }
        if let Some(v) = ov.max_concurrent_sources {
            self.max_concurrent_sources = v.max(1);
        }
        if let Some(v) = ov.max_in_flight_details {
            self.max_in_flight_details = v.max(1);
        }
        if let Some(v) = ov.threshold {
            self.threshold = v;
        }
        if let Some(v) = ov.strategy {
            self.strategy = v;
        }
        if let Some(v) = ov.max_message_len {
            self.max_message_len = v;
        }
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("REGISTRY_URL") {
            self.registry_url = v;
        }
        if let Ok(v) = std::env::var("GATEWAY_URL") {
            self.gateway_url = v;
        }
        if let Some(v) = env_u64("POLL_INTERVAL_SECS") {
            self.poll_interval = Duration::from_secs(v);
        }
        if let Some(v) = env_u64("SOURCE_TIMEOUT_SECS") {
            self.source_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env_usize("MAX_CONCURRENT_SOURCES") {
            self.max_concurrent_sources = v.max(1);
        }
        if let Some(v) = env_usize("MAX_IN_FLIGHT_DETAILS") {
            self.max_in_flight_details = v.max(1);
        }
        if let Some(v) = env_u64("PROPOSAL_THRESHOLD") {
            self.threshold = v;
        }
        if let Ok(v) = std::env::var("DIFF_STRATEGY") {
            match v.to_ascii_lowercase().as_str() {
                "threshold" => self.strategy = DiffStrategy::Threshold,
                "set-add" | "setadd" => self.strategy = DiffStrategy::SetAdd,
                other => tracing::warn!(strategy = other, "unknown DIFF_STRATEGY, keeping current"),
            }
        }
        if let Some(v) = env_usize("MAX_MESSAGE_LEN") {
            self.max_message_len = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    fn clear_env() {
        for k in [
            ENV_CONFIG_PATH,
            "REGISTRY_URL",
            "GATEWAY_URL",
            "POLL_INTERVAL_SECS",
            "SOURCE_TIMEOUT_SECS",
            "MAX_CONCURRENT_SOURCES",
            "MAX_IN_FLIGHT_DETAILS",
            "PROPOSAL_THRESHOLD",
            "DIFF_STRATEGY",
            "MAX_MESSAGE_LEN",
        ] {
            env::remove_var(k);
        }
    }

    #[serial_test::serial]
    #[test]
    fn defaults_when_nothing_is_set() {
        clear_env();
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        let cfg = MonitorConfig::load().unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_secs(5));
        assert_eq!(cfg.threshold, 1);
        assert_eq!(cfg.strategy, DiffStrategy::Threshold);
        assert_eq!(cfg.max_message_len, 250);

        env::set_current_dir(&old).unwrap();
    }

    #[serial_test::serial]
    #[test]
    fn file_overrides_then_env_wins() {
        clear_env();
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        let p = tmp.path().join("monitor.toml");
        fs::write(
            &p,
            r#"
poll_interval_secs = 60
strategy = "set-add"
threshold = 3
"#,
        )
        .unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        env::set_var("PROPOSAL_THRESHOLD", "7");

        let cfg = MonitorConfig::load().unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_secs(60));
        assert_eq!(cfg.strategy, DiffStrategy::SetAdd);
        // env beats file
        assert_eq!(cfg.threshold, 7);

        clear_env();
        env::set_current_dir(&old).unwrap();
    }

    #[serial_test::serial]
    #[test]
    fn missing_explicit_path_is_an_error() {
        clear_env();
        env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
        assert!(MonitorConfig::load().is_err());
        clear_env();
    }
}
