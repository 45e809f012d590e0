//! Core configuration types and defaults.

use crate::error::ScoutError;
use crate::gate::GatePolicy;
use crate::peers::DEFAULT_STALE_AFTER_MS;
use crate::perception::RegionId;
use crate::session::SessionConfig;
use crate::target::TargetSelector;
use crate::zone::ZoneId;
use std::collections::HashMap;

/// Everything the coordinator needs to run: relay endpoint, monitored
/// zones, target identity, and gating thresholds.
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    /// Relay endpoint and timing policy
    pub session: SessionConfig,
    /// Static mapping from monitored regions to zones
    pub zones: HashMap<RegionId, ZoneId>,
    /// Target identity predicate
    pub selector: TargetSelector,
    /// Report gating thresholds
    pub gate: GatePolicy,
    /// Peer record age at which display hides it
    pub stale_after_ms: u64,
    /// Bounded attempts for a requested world jump
    pub max_jump_attempts: u8,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        let mut zones = HashMap::new();
        // The three monitored camp regions; zone id doubles as the
        // wire-level chunk value.
        zones.insert(4913, ZoneId(4913));
        zones.insert(4911, ZoneId(4911));
        zones.insert(5424, ZoneId(5424));

        Self {
            session: SessionConfig::new("wss://scout-relay.example.net"),
            zones,
            selector: TargetSelector {
                canonical_id: 14779,
                name_token: "gemstone".to_string(),
                class_token: "crab".to_string(),
                exclude_token: "shell".to_string(),
            },
            gate: GatePolicy::default(),
            stale_after_ms: DEFAULT_STALE_AFTER_MS,
            max_jump_attempts: 3,
        }
    }
}

impl ScoutConfig {
    /// Validates the configuration for consistency.
    pub fn validate(&self) -> Result<(), ScoutError> {
        if !self.session.url.starts_with("ws://") && !self.session.url.starts_with("wss://") {
            return Err(ScoutError::Config(format!(
                "relay url must be a ws:// or wss:// endpoint, got: {}",
                self.session.url
            )));
        }
        if self.zones.is_empty() {
            return Err(ScoutError::Config(
                "at least one monitored zone is required".to_string(),
            ));
        }
        if self.session.ping_interval.is_zero() {
            return Err(ScoutError::Config(
                "session.ping_interval must be greater than 0".to_string(),
            ));
        }
        if self.gate.heartbeat_ticks == 0 {
            return Err(ScoutError::Config(
                "gate.heartbeat_ticks must be greater than 0".to_string(),
            ));
        }
        if self.gate.no_sight_ticks == 0 {
            return Err(ScoutError::Config(
                "gate.no_sight_ticks must be greater than 0".to_string(),
            ));
        }
        if self.max_jump_attempts == 0 {
            return Err(ScoutError::Config(
                "max_jump_attempts must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
