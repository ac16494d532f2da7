use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use bc4000::LanConfig;
use bc4000::config::millis;
use serde::{Deserialize, Serialize};

/// Everything the node reads from its optional TOML file. Missing keys keep
/// their defaults, and command-line flags win over the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Stop after this many simulation ticks; `None` runs until the peer
    /// goes quiet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticks: Option<u64>,
    /// How long a joiner listens for `AVAILABLE` before picking a host.
    #[serde(rename = "discovery_window_ms", with = "millis")]
    pub discovery_window: Duration,
    #[serde(rename = "join_retry_ms", with = "millis")]
    pub join_retry: Duration,
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,
    // Last, so it serializes as a trailing `[lan]` table.
    pub lan: LanConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            ticks: None,
            discovery_window: Duration::from_secs(1),
            join_retry: Duration::from_millis(500),
            poll_interval: Duration::from_millis(2),
            lan: LanConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc4000::Address;

    #[test]
    fn file_overrides_only_what_it_names() {
        let config: NodeConfig = toml::from_str(
            r#"
            ticks = 600
            join_retry_ms = 250

            [lan]
            broadcast = "10.0.0.255:5000"
            tick_rate = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.ticks, Some(600));
        assert_eq!(config.join_retry, Duration::from_millis(250));
        assert_eq!(config.discovery_window, Duration::from_secs(1));
        assert_eq!(config.lan.broadcast, Address::new(10, 0, 0, 255, 5000));
        assert_eq!(config.lan.tick_rate, 30);
        assert_eq!(config.lan.port, bc4000::DEFAULT_PORT);
    }

    #[test]
    fn load_reports_the_path() {
        let missing = Path::new("/nonexistent/bc4000-node.toml");
        let err = NodeConfig::load(missing).unwrap_err();
        assert!(err.to_string().contains("bc4000-node.toml"));
    }

    #[test]
    fn load_reads_a_file() {
        let path = std::env::temp_dir().join(format!("bc4000-node-{}.toml", std::process::id()));
        let written = NodeConfig {
            ticks: Some(42),
            ..NodeConfig::default()
        };
        std::fs::write(&path, toml::to_string(&written).unwrap()).unwrap();

        let loaded = NodeConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, written);
    }
}
