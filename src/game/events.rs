//! Simulation Events
//!
//! Typed notifications from the simulation and sync layers to whatever
//! renders the world, plus the requests a tick asks the session to send.
//! Collected per tick and broadcast by the session.

use serde::{Serialize, Deserialize};

use crate::game::actor::{ActorId, ActorKind};
use crate::game::map::TileCoord;

/// Something observable happened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    /// A new actor entered the registry.
    ActorJoined {
        /// New actor
        id: ActorId,
        /// Its kind
        kind: ActorKind,
    },

    /// An actor was removed from the registry.
    ActorLeft {
        /// Removed actor
        id: ActorId,
    },

    /// A hunter picked up a player.
    Captured {
        /// Hunter
        hunter: ActorId,
        /// Player
        player: ActorId,
    },

    /// A hunter let go of a player.
    Released {
        /// Hunter
        hunter: ActorId,
        /// Player
        player: ActorId,
    },

    /// An actor entered or left a hiding spot.
    HidingChanged {
        /// Actor
        id: ActorId,
        /// New hidden state
        hidden: bool,
        /// Spot involved, when one was found at the actor's tile
        spot: Option<TileCoord>,
    },

    /// A door's authoritative state changed.
    DoorChanged {
        /// Door tile
        door: TileCoord,
        /// New state
        is_open: bool,
    },

    /// An actor's light changed.
    LightChanged {
        /// Actor
        id: ActorId,
        /// New state
        on: bool,
    },

    /// Login or reconnect succeeded.
    LoggedIn {
        /// Assigned player id
        player_id: ActorId,
        /// Display name, if the server sent one
        username: Option<String>,
    },

    /// Login was refused.
    LoginFailed {
        /// Server message
        message: Option<String>,
    },

    /// Reconnect was refused; stored credentials should be discarded.
    CredentialsRejected {
        /// Server message
        message: Option<String>,
    },

    /// Local session ended.
    LoggedOut,

    /// Connected roster replaced.
    RosterUpdated {
        /// Number of connected players
        count: usize,
    },
}

/// Request the local client must send outward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionRequest {
    /// Ask the server to flip a door
    ToggleDoor(TileCoord),
    /// Tell the server the local player entered or left a hiding spot
    ToggleHiding,
    /// Tell the server the local light was flipped
    ToggleLight,
}
