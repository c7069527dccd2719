//! Motion Resolution
//!
//! Axis-separated movement: X is tried first, then Y from wherever X left
//! the actor. An axis is rejected if its candidate box touches a solid tile
//! or a blocking actor.
//!
//! When both axes are rejected the corner-unstick rule lets one through: the
//! X axis if it was only blocked by an actor, else the Y axis if it was only
//! blocked by an actor. Walls are never crossed.

use tracing::trace;

use crate::core::vec2::Vec2;
use crate::game::actor::{Actor, Collidable, Movable};
use crate::game::collision::{check_actor_collision, check_tile_collision};
use crate::game::interact::InteractableRegistry;
use crate::game::map::TileMap;
use crate::game::registry::EntityRegistry;

/// Why an axis did not move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AxisBlock {
    /// Axis applied (or had nothing to apply)
    #[default]
    Free,
    /// Candidate box touched a wall or closed door
    Wall,
    /// Candidate box overlapped a blocking actor
    Actor,
}

/// Result of one movement step.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct MoveOutcome {
    /// Resolved position
    pub position: Vec2,
    /// X-axis verdict
    pub x: AxisBlock,
    /// Y-axis verdict
    pub y: AxisBlock,
    /// Whether the corner-unstick rule forced an axis through
    pub unstuck: bool,
}

impl MoveOutcome {
    fn stationary(position: Vec2) -> Self {
        Self { position, ..Self::default() }
    }
}

/// Resolve one step of movement for `actor`.
///
/// `direction` is normalized here, so raw 8-way input may be passed directly.
/// Carried and hidden actors do not move.
pub fn resolve_move(
    actor: &Actor,
    direction: Vec2,
    dt: f64,
    map: &TileMap,
    interactables: &InteractableRegistry,
    others: &EntityRegistry,
) -> MoveOutcome {
    let start = actor.position();
    let direction = direction.normalize_or_zero();
    if !actor.can_move() || direction.is_zero() || dt <= 0.0 {
        return MoveOutcome::stationary(start);
    }

    let delta = direction * (actor.speed() * dt);
    let base = actor.bounds();

    let classify = |dx: f64, dy: f64| -> AxisBlock {
        if dx == 0.0 && dy == 0.0 {
            return AxisBlock::Free;
        }
        let candidate = base.translate(dx, dy);
        if check_tile_collision(&candidate, map, interactables).is_some() {
            AxisBlock::Wall
        } else if check_actor_collision(&candidate, &actor.id, actor.kind, others).is_some() {
            AxisBlock::Actor
        } else {
            AxisBlock::Free
        }
    };

    // X first.
    let x = classify(delta.x, 0.0);
    let applied_x = if x == AxisBlock::Free { delta.x } else { 0.0 };

    // Then Y, from the post-X position.
    let y = classify(applied_x, delta.y);
    let applied_y = if y == AxisBlock::Free { delta.y } else { 0.0 };

    let mut outcome = MoveOutcome {
        position: start + Vec2::new(applied_x, applied_y),
        x,
        y,
        unstuck: false,
    };

    if x != AxisBlock::Free && y != AxisBlock::Free {
        if x != AxisBlock::Wall {
            outcome.position = start + Vec2::new(delta.x, 0.0);
            outcome.unstuck = true;
        } else if y != AxisBlock::Wall {
            outcome.position = start + Vec2::new(0.0, delta.y);
            outcome.unstuck = true;
        }
    }

    trace!(
        actor = %actor.id,
        x = outcome.position.x,
        y = outcome.position.y,
        block_x = ?outcome.x,
        block_y = ?outcome.y,
        unstuck = outcome.unstuck,
        "Resolved move"
    );

    outcome
}

// =============================================================================
// TESTS
// =============================================================================
