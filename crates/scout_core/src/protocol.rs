//! Wire message definitions for client-relay communication.
//!
//! This module defines the JSON message schema exchanged with the relay,
//! providing a standardized format for zone subscription, state reporting,
//! and aggregated peer updates. The relay is authoritative for reporter
//! role arbitration; clients only describe what they observe.

use crate::error::ScoutError;
use serde::{Deserialize, Serialize};

/// A message sent from the client to the relay.
///
/// All client messages are tagged with a lowercase `type` field and use
/// camelCase member names on the wire.
///
/// # Examples
///
/// Joining a world/zone channel:
/// ```json
/// {"type":"join","world":301,"chunk":4913}
/// ```
///
/// Reporting observed target state:
/// ```json
/// {"type":"report","world":301,"chunk":4913,"health":80,"totalPlayers":3,"attackingPlayers":1}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Subscribe to a world's zone channel. Sent on zone entry and re-sent
    /// after every reconnect, since the relay keeps no session memory.
    Join { world: u32, chunk: u32 },

    /// Unsubscribe from a world's channel. Safe to lose; the relay times
    /// absent clients out through the report freshness mechanism.
    Leave { world: u32 },

    /// Observed target state for a world. Only the elected reporter for a
    /// world is expected to send these.
    Report {
        world: u32,
        chunk: u32,
        health: u8,
        #[serde(rename = "totalPlayers")]
        total_players: u32,
        #[serde(rename = "attackingPlayers")]
        attacking_players: u32,
    },

    /// Voluntary surrender of the reporter role, letting the relay elect
    /// another client for this world.
    Resign { world: u32 },
}

/// A message received from the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RelayMessage {
    /// Reporter role grant or revocation for this client's current world.
    Role {
        #[serde(rename = "isReporter")]
        is_reporter: bool,
    },

    /// Aggregated per-world target reports, fanned out to every subscriber.
    Update { worlds: Vec<PeerRecord> },
}

/// One world's most recent target report as distributed by the relay.
///
/// The client holds read-only copies keyed by world; a newer record for the
/// same world overwrites the prior one. Staleness is derived from
/// `last_update`, never signalled explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerRecord {
    /// Game world the report describes
    pub world: u32,
    /// Zone (wire-level chunk) the target was observed in
    pub chunk: u32,
    /// Target health percentage, 0..=100
    pub health: u8,
    /// Players present in the zone
    pub total_players: u32,
    /// Players actively engaging the target
    pub attacking_players: u32,
    /// Relay-stamped report time, epoch milliseconds
    pub last_update: u64,
}

/// Serializes a client message to its wire form.
pub fn encode_client(message: &ClientMessage) -> String {
    // ClientMessage contains no map keys or non-string-keyed types, so
    // serialization cannot fail.
    serde_json::to_string(message).expect("client message serialization")
}

/// Parses one inbound relay frame.
///
/// A malformed frame, an unknown `type`, or a missing required field aborts
/// processing of that single message only; callers log and drop the frame
/// without touching connection state.
pub fn decode_relay(text: &str) -> Result<RelayMessage, ScoutError> {
    serde_json::from_str(text).map_err(|e| ScoutError::Protocol(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_wire_shape() {
        let json = encode_client(&ClientMessage::Join {
            world: 301,
            chunk: 4913,
        });
        assert_eq!(json, r#"{"type":"join","world":301,"chunk":4913}"#);
    }

    #[test]
    fn leave_wire_shape() {
        let json = encode_client(&ClientMessage::Leave { world: 301 });
        assert_eq!(json, r#"{"type":"leave","world":301}"#);
    }

    #[test]
    fn report_wire_shape() {
        let json = encode_client(&ClientMessage::Report {
            world: 301,
            chunk: 4913,
            health: 80,
            total_players: 3,
            attacking_players: 1,
        });
        assert_eq!(
            json,
            r#"{"type":"report","world":301,"chunk":4913,"health":80,"totalPlayers":3,"attackingPlayers":1}"#
        );
    }

    #[test]
    fn resign_wire_shape() {
        let json = encode_client(&ClientMessage::Resign { world: 301 });
        assert_eq!(json, r#"{"type":"resign","world":301}"#);
    }

    #[test]
    fn decode_role_grant() {
        let msg = decode_relay(r#"{"type":"role","isReporter":true}"#).unwrap();
        assert_eq!(msg, RelayMessage::Role { is_reporter: true });
    }

    #[test]
    fn decode_update() {
        let msg = decode_relay(
            r#"{"type":"update","worlds":[
                {"world":301,"chunk":4913,"health":80,"totalPlayers":3,"attackingPlayers":1,"lastUpdate":1700000000000},
                {"world":302,"chunk":4911,"health":15,"totalPlayers":12,"attackingPlayers":9,"lastUpdate":1700000005000}
            ]}"#,
        )
        .unwrap();

        let RelayMessage::Update { worlds } = msg else {
            panic!("expected update message");
        };
        assert_eq!(worlds.len(), 2);
        assert_eq!(worlds[0].world, 301);
        assert_eq!(worlds[0].total_players, 3);
        assert_eq!(worlds[1].health, 15);
        assert_eq!(worlds[1].last_update, 1_700_000_005_000);
    }

    #[test]
    fn unknown_type_is_an_error() {
        assert!(decode_relay(r#"{"type":"broadcast","body":"hello"}"#).is_err());
    }

    #[test]
    fn missing_field_is_an_error() {
        assert!(decode_relay(r#"{"type":"role"}"#).is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(decode_relay("not json at all").is_err());
    }
}
