//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every message is a JSON object discriminated by its `type` field.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use serde_json::Value;
use thiserror::Error;

use crate::game::events::ActionRequest;

/// Inbound `type` values this client understands.
pub const INBOUND_TYPES: [&str; 4] = ["login_response", "reconnect_response", "player_list", "state"];

/// Protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Not JSON, no `type`, or fields of the wrong shape.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Well-formed, but of a type this client does not handle.
    #[error("unknown message type {0:?}")]
    UnknownType(String),

    /// Outbound message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Start a new session.
    #[serde(rename = "login")]
    Login {
        /// Display name
        username: String,
    },

    /// Resume a previous session with stored credentials.
    #[serde(rename = "reconnect")]
    Reconnect {
        /// Previously assigned id
        player_id: String,
        /// Display name
        username: String,
    },

    /// End the session.
    #[serde(rename = "logout")]
    Logout {
        /// Id being logged out
        player_id: String,
    },

    /// Local player position, in pixels.
    #[serde(rename = "position")]
    Position {
        /// X
        x: f64,
        /// Y
        y: f64,
    },

    /// Ask the server to flip the door at a tile.
    #[serde(rename = "toggleDoor")]
    ToggleDoor {
        /// Tile column
        x: i32,
        /// Tile row
        y: i32,
    },

    /// Local player entered or left a hiding spot.
    #[serde(rename = "toggleHiding")]
    ToggleHiding,

    /// Local player flipped their light.
    #[serde(rename = "toggleLight")]
    ToggleLight,
}

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl From<ActionRequest> for ClientMessage {
    fn from(request: ActionRequest) -> Self {
        match request {
            ActionRequest::ToggleDoor(door) => ClientMessage::ToggleDoor { x: door.x, y: door.y },
            ActionRequest::ToggleHiding => ClientMessage::ToggleHiding,
            ActionRequest::ToggleLight => ClientMessage::ToggleLight,
        }
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Answer to `login`.
    LoginResponse(AuthResponse),

    /// Answer to `reconnect`.
    ReconnectResponse(AuthResponse),

    /// Connected players.
    PlayerList {
        /// id -> username
        players: BTreeMap<String, String>,
    },

    /// World snapshot.
    State(StateMessage),
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON string, telling unknown types apart from
    /// malformed ones.
    pub fn from_json(s: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(s).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::Malformed("missing \"type\"".to_string()))?;
        if !INBOUND_TYPES.contains(&kind) {
            return Err(ProtocolError::UnknownType(kind.to_string()));
        }

        serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

/// Login or reconnect outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Whether the server accepted the request
    pub success: bool,
    /// Assigned player id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    /// Confirmed username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Human-readable reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Pixel position on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WirePosition {
    /// X
    pub x: f64,
    /// Y
    pub y: f64,
}

/// Hunter entry of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireHunter {
    /// X
    pub x: f64,
    /// Y
    pub y: f64,
    /// Carried player id, or null
    #[serde(default)]
    pub carrying: Option<String>,
}

/// Raw `state` snapshot. Door keys are still `"x,y"` strings here; they are
/// validated when converted into a `sync::Snapshot`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateMessage {
    /// id -> position
    #[serde(default)]
    pub positions: BTreeMap<String, WirePosition>,
    /// "x,y" -> is open
    #[serde(default)]
    pub doors: BTreeMap<String, bool>,
    /// id -> light on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lights: Option<BTreeMap<String, bool>>,
    /// Ids currently hidden
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<Vec<String>>,
    /// id -> hunter state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hunters: Option<BTreeMap<String, WireHunter>>,
}

// =============================================================================
// TESTS
// =============================================================================
