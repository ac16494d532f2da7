use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::discovery::MAX_AVAILABLE_GAMES;
use crate::net::{Address, DEFAULT_PORT, DEFAULT_TICK_RATE};

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanConfig {
    /// Shared by discovery and gameplay.
    pub port: u16,
    /// Where `DISCOVER` goes.
    pub broadcast: Address,
    pub max_candidates: usize,
    #[serde(rename = "idle_timeout_ms", with = "millis")]
    pub idle_timeout: Duration,
    pub tick_rate: u32,
}

impl Default for LanConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            broadcast: Address::broadcast(DEFAULT_PORT),
            max_candidates: MAX_AVAILABLE_GAMES,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            tick_rate: DEFAULT_TICK_RATE,
        }
    }
}

/// `Duration` as whole milliseconds, for config files.
pub mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config: LanConfig = toml::from_str(
            r#"
            port = 6000
            broadcast = "192.168.1.255:6000"
            idle_timeout_ms = 1500
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 6000);
        assert_eq!(config.broadcast, Address::new(192, 168, 1, 255, 6000));
        assert_eq!(config.idle_timeout, Duration::from_millis(1500));
        assert_eq!(config.max_candidates, MAX_AVAILABLE_GAMES);
        assert_eq!(config.tick_rate, DEFAULT_TICK_RATE);
    }

    #[test]
    fn written_config_reads_back() {
        let config = LanConfig {
            tick_rate: 30,
            idle_timeout: Duration::from_secs(2),
            ..LanConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("broadcast = \"255.255.255.255:5000\""));
        assert!(text.contains("idle_timeout_ms = 2000"));
        assert_eq!(toml::from_str::<LanConfig>(&text).unwrap(), config);
    }

    #[test]
    fn bad_address_is_rejected() {
        assert!(toml::from_str::<LanConfig>("broadcast = \"not-an-address\"").is_err());
    }
}
