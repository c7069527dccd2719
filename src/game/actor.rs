//! Actors
//!
//! Players and hunters share one representation discriminated by [`ActorKind`].
//! Behaviour differences go through the capability traits below rather than
//! through type checks at call sites.

use std::borrow::Borrow;
use std::fmt;

use serde::{Serialize, Deserialize};

use crate::core::aabb::Rect;
use crate::core::vec2::Vec2;
use crate::game::map::TileCoord;

/// Player movement speed, pixels per second.
pub const PLAYER_SPEED: f64 = 120.0;

/// Hunter movement speed, pixels per second.
pub const HUNTER_SPEED: f64 = 130.0;

/// Edge length of every actor's bounding box, in pixels.
pub const ACTOR_SIZE: f64 = 30.0;

/// Where new actors appear before their first position is known.
pub const DEFAULT_SPAWN: Vec2 = Vec2::new(100.0, 100.0);

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Actor identifier as assigned by the server.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Wrap a server-assigned id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ActorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for ActorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Actor discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// Hides, can be captured and carried
    Player,
    /// Captures and carries players
    Hunter,
}

impl ActorKind {
    /// Movement speed for this kind.
    pub fn speed(self) -> f64 {
        match self {
            ActorKind::Player => PLAYER_SPEED,
            ActorKind::Hunter => HUNTER_SPEED,
        }
    }
}

// =============================================================================
// ACTOR
// =============================================================================

/// A player or hunter in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    /// Unique id
    pub id: ActorId,
    /// Player or Hunter
    pub kind: ActorKind,
    /// Top-left corner of the bounding box
    pub position: Vec2,
    /// Bounding box size
    pub size: Vec2,
    /// Currently inside a hiding spot
    pub is_hidden: bool,
    /// Currently carried by a hunter
    pub is_carried: bool,
    /// Hunter carrying this player
    pub carried_by: Option<ActorId>,
    /// Player carried by this hunter
    pub carrying: Option<ActorId>,
    /// Light toggle
    pub light_on: bool,
}

impl Actor {
    /// Create an actor of the given kind.
    pub fn new(id: ActorId, kind: ActorKind, position: Vec2) -> Self {
        Self {
            id,
            kind,
            position,
            size: Vec2::new(ACTOR_SIZE, ACTOR_SIZE),
            is_hidden: false,
            is_carried: false,
            carried_by: None,
            carrying: None,
            light_on: true,
        }
    }

    /// Create a player.
    pub fn player(id: impl Into<ActorId>, position: Vec2) -> Self {
        Self::new(id.into(), ActorKind::Player, position)
    }

    /// Create a hunter.
    pub fn hunter(id: impl Into<ActorId>, position: Vec2) -> Self {
        Self::new(id.into(), ActorKind::Hunter, position)
    }

    /// Check kind.
    #[inline]
    pub fn is_player(&self) -> bool {
        self.kind == ActorKind::Player
    }

    /// Check kind.
    #[inline]
    pub fn is_hunter(&self) -> bool {
        self.kind == ActorKind::Hunter
    }

    /// Tile under the centre of the bounding box.
    pub fn tile(&self) -> TileCoord {
        let c = self.bounds().center();
        TileCoord::from_pixel(c.x, c.y)
    }

    /// Eligible to be picked up by a hunter.
    pub fn is_capturable(&self) -> bool {
        self.is_player() && !self.is_hidden && !self.is_carried
    }
}

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Actors that move under input.
pub trait Movable {
    /// Pixels per second.
    fn speed(&self) -> f64;
    /// Current position.
    fn position(&self) -> Vec2;
    /// Overwrite position.
    fn set_position(&mut self, position: Vec2);
    /// Whether input may move this actor now.
    fn can_move(&self) -> bool;
}

/// Actors that take part in collision.
pub trait Collidable {
    /// Bounding box.
    fn bounds(&self) -> Rect;
    /// Whether this actor stops a mover of the given kind.
    fn blocks(&self, mover: ActorKind) -> bool;
}

/// Actors that a hunter can carry.
pub trait Carriable {
    /// Hunter currently carrying this actor.
    fn carrier(&self) -> Option<&ActorId>;
    /// Attach to a hunter.
    fn attach_to(&mut self, hunter: &ActorId);
    /// Detach from any hunter.
    fn detach(&mut self);
}

impl Movable for Actor {
    fn speed(&self) -> f64 {
        self.kind.speed()
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn can_move(&self) -> bool {
        !self.is_carried && !self.is_hidden
    }
}

impl Collidable for Actor {
    fn bounds(&self) -> Rect {
        Rect::from_parts(self.position, self.size)
    }

    fn blocks(&self, mover: ActorKind) -> bool {
        // Hunters walk through bodies so that they can reach and capture them.
        mover == ActorKind::Player
            && self.kind == ActorKind::Player
            && !self.is_hidden
            && !self.is_carried
    }
}

impl Carriable for Actor {
    fn carrier(&self) -> Option<&ActorId> {
        self.carried_by.as_ref()
    }

    fn attach_to(&mut self, hunter: &ActorId) {
        self.is_carried = true;
        self.carried_by = Some(hunter.clone());
    }

    fn detach(&mut self) {
        self.is_carried = false;
        self.carried_by = None;
    }
}

// =============================================================================
// TESTS
// =============================================================================
