//! Configuration management for the bosswatch client.
//!
//! This module handles loading, validation, and conversion of client
//! configuration from TOML files and command-line arguments.

use scout_core::{GatePolicy, ScoutConfig, SessionConfig, TargetSelector, ZoneId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_health_delta() -> u8 {
    5
}

fn default_heartbeat_ticks() -> u32 {
    100
}

fn default_no_sight_ticks() -> u32 {
    50
}

fn default_stale_after_ms() -> u64 {
    90_000
}

fn default_max_jump_attempts() -> u8 {
    3
}

fn default_tick_interval_ms() -> u64 {
    600
}

fn default_world() -> u32 {
    301
}

fn default_entry_delay_ticks() -> u32 {
    10
}

fn default_respawn_delay_ticks() -> u32 {
    20
}

fn default_max_players() -> u32 {
    8
}

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Relay connection settings
    pub relay: RelaySettings,
    /// Scouting behavior settings
    pub scouting: ScoutingSettings,
    /// Simulated observer settings
    #[serde(default)]
    pub simulation: SimulationSettings,
    /// Logging configuration settings
    pub logging: LoggingSettings,
}

/// Relay endpoint and timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    /// WebSocket URL of the relay (e.g., "wss://relay.example.net")
    pub url: String,
    /// Fixed delay between disconnect and reconnect attempt, in seconds
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    /// Keepalive ping cadence while connected, in seconds
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

/// Scouting behavior: monitored zones, target identity, gating thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutingSettings {
    /// Monitored zones; at least one is required
    pub zones: Vec<ZoneSettings>,
    /// Target identity predicate
    pub target: TargetSettings,
    /// Health change (percentage points) that must be exceeded to report
    #[serde(default = "default_health_delta")]
    pub health_delta: u8,
    /// Ticks without a report before a heartbeat report is forced
    #[serde(default = "default_heartbeat_ticks")]
    pub heartbeat_ticks: u32,
    /// Consecutive target-missing ticks before resigning the reporter role
    #[serde(default = "default_no_sight_ticks")]
    pub no_sight_ticks: u32,
    /// Peer record age in milliseconds at which display hides it
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,
    /// Bounded attempts for a requested world jump
    #[serde(default = "default_max_jump_attempts")]
    pub max_jump_attempts: u8,
    /// Simulation tick interval in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// One monitored zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSettings {
    /// Region identifier of the zone (doubles as the wire-level chunk)
    pub region: u32,
    /// Display name for logs and status output
    pub name: String,
}

/// Target identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSettings {
    /// Canonical entity type identifier
    pub canonical_id: u32,
    /// Token the fuzzy name match requires
    pub name_token: String,
    /// Second token the fuzzy name match requires
    pub class_token: String,
    /// Token that disqualifies an otherwise-matching name
    pub exclude_token: String,
}

/// Simulated observer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// World number the simulated observer plays on
    #[serde(default = "default_world")]
    pub world: u32,
    /// Ticks spent outside before walking into the first zone
    #[serde(default = "default_entry_delay_ticks")]
    pub entry_delay_ticks: u32,
    /// Ticks between a target dying and the next one spawning
    #[serde(default = "default_respawn_delay_ticks")]
    pub respawn_delay_ticks: u32,
    /// Upper bound on simulated players in the zone
    #[serde(default = "default_max_players")]
    pub max_players: u32,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
    /// Optional file path for log output (None means stdout only)
    pub file_path: Option<String>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            world: default_world(),
            entry_delay_ticks: default_entry_delay_ticks(),
            respawn_delay_ticks: default_respawn_delay_ticks(),
            max_players: default_max_players(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            relay: RelaySettings {
                url: "wss://scout-relay.example.net".to_string(),
                reconnect_delay_secs: default_reconnect_delay_secs(),
                ping_interval_secs: default_ping_interval_secs(),
            },
            scouting: ScoutingSettings {
                zones: vec![
                    ZoneSettings {
                        region: 4913,
                        name: "North".to_string(),
                    },
                    ZoneSettings {
                        region: 4911,
                        name: "West".to_string(),
                    },
                    ZoneSettings {
                        region: 5424,
                        name: "East".to_string(),
                    },
                ],
                target: TargetSettings {
                    canonical_id: 14779,
                    name_token: "gemstone".to_string(),
                    class_token: "crab".to_string(),
                    exclude_token: "shell".to_string(),
                },
                health_delta: default_health_delta(),
                heartbeat_ticks: default_heartbeat_ticks(),
                no_sight_ticks: default_no_sight_ticks(),
                stale_after_ms: default_stale_after_ms(),
                max_jump_attempts: default_max_jump_attempts(),
                tick_interval_ms: default_tick_interval_ms(),
            },
            simulation: SimulationSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
                file_path: None,
            },
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at
    /// the specified path and returns the default configuration.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Converts the application configuration to the core scouting
    /// configuration.
    pub fn to_scout_config(&self) -> ScoutConfig {
        let mut session = SessionConfig::new(self.relay.url.clone());
        session.reconnect_delay = Duration::from_secs(self.relay.reconnect_delay_secs);
        session.ping_interval = Duration::from_secs(self.relay.ping_interval_secs);

        let mut zones = HashMap::new();
        for zone in &self.scouting.zones {
            zones.insert(zone.region, ZoneId(zone.region));
        }

        ScoutConfig {
            session,
            zones,
            selector: TargetSelector {
                canonical_id: self.scouting.target.canonical_id,
                name_token: self.scouting.target.name_token.to_lowercase(),
                class_token: self.scouting.target.class_token.to_lowercase(),
                exclude_token: self.scouting.target.exclude_token.to_lowercase(),
            },
            gate: GatePolicy {
                health_delta: self.scouting.health_delta,
                heartbeat_ticks: self.scouting.heartbeat_ticks,
                no_sight_ticks: self.scouting.no_sight_ticks,
            },
            stale_after_ms: self.scouting.stale_after_ms,
            max_jump_attempts: self.scouting.max_jump_attempts,
        }
    }

    /// Display name for a zone region, for logs and status output.
    pub fn zone_name(&self, region: u32) -> &str {
        self.scouting
            .zones
            .iter()
            .find(|z| z.region == region)
            .map(|z| z.name.as_str())
            .unwrap_or("Unknown")
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        if !self.relay.url.starts_with("ws://") && !self.relay.url.starts_with("wss://") {
            return Err(format!(
                "Invalid relay url (must be ws:// or wss://): {}",
                self.relay.url
            ));
        }

        if self.scouting.zones.is_empty() {
            return Err("At least one monitored zone is required".to_string());
        }

        if self.relay.ping_interval_secs == 0 {
            return Err("relay.ping_interval_secs must be greater than 0".to_string());
        }

        if self.scouting.heartbeat_ticks == 0 {
            return Err("scouting.heartbeat_ticks must be greater than 0".to_string());
        }

        if self.scouting.no_sight_ticks == 0 {
            return Err("scouting.no_sight_ticks must be greater than 0".to_string());
        }

        if self.scouting.tick_interval_ms == 0 {
            return Err("scouting.tick_interval_ms must be greater than 0".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        assert_eq!(config.relay.reconnect_delay_secs, 5);
        assert_eq!(config.scouting.zones.len(), 3);
        assert_eq!(config.scouting.heartbeat_ticks, 100);
        assert_eq!(config.scouting.no_sight_ticks, 50);
        assert_eq!(config.logging.level, "info");

        let scout = config.to_scout_config();
        assert_eq!(scout.zones.len(), 3);
        assert_eq!(scout.zones.get(&4913), Some(&ZoneId(4913)));
        assert_eq!(scout.session.reconnect_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.relay.url = "http://not-a-websocket".to_string();
        assert!(config.validate().is_err());

        config.relay.url = "wss://relay.example.net".to_string();
        config.scouting.zones.clear();
        assert!(config.validate().is_err());

        config.scouting.zones.push(ZoneSettings {
            region: 4913,
            name: "North".to_string(),
        });
        config.logging.level = "noisy".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zone_name_lookup() {
        let config = AppConfig::default();
        assert_eq!(config.zone_name(4913), "North");
        assert_eq!(config.zone_name(4911), "West");
        assert_eq!(config.zone_name(1), "Unknown");
    }

    #[test]
    fn test_selector_tokens_are_lowercased() {
        let mut config = AppConfig::default();
        config.scouting.target.name_token = "Gemstone".to_string();
        let scout = config.to_scout_config();
        assert_eq!(scout.selector.name_token, "gemstone");
    }

    #[tokio::test]
    async fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bosswatch.toml");

        // First load creates the file with defaults.
        let created = AppConfig::load_from_file(&path).await.expect("create");
        assert!(path.exists());

        // Second load reads it back unchanged.
        let loaded = AppConfig::load_from_file(&path).await.expect("load");
        assert_eq!(created.relay.url, loaded.relay.url);
        assert_eq!(created.scouting.zones.len(), loaded.scouting.zones.len());
        assert!(loaded.validate().is_ok());
    }
}
