//! Collision Queries
//!
//! Solidity of tiles under the current door states, and actor-vs-actor
//! blocking. Movement resolution in `motion` is built on these checks.

use crate::core::aabb::Rect;
use crate::game::actor::{ActorId, ActorKind, Collidable};
use crate::game::interact::InteractableRegistry;
use crate::game::map::{TileCoord, TileKind, TileMap};
use crate::game::registry::EntityRegistry;

/// Whether a tile blocks movement right now.
///
/// Walls always do; door cells do while their door is closed. Cells outside
/// the grid never do.
pub fn is_solid(map: &TileMap, interactables: &InteractableRegistry, coord: TileCoord) -> bool {
    match map.tile(coord) {
        Some(TileKind::Wall) => true,
        Some(TileKind::Door) => interactables.is_door_closed(coord),
        _ => false,
    }
}

/// Check a rectangle against every tile it touches.
pub fn check_tile_collision(
    rect: &Rect,
    map: &TileMap,
    interactables: &InteractableRegistry,
) -> Option<TileCoord> {
    map.tiles_within(rect).find(|c| is_solid(map, interactables, *c))
}

/// Check a mover's rectangle against other actors. Returns the first
/// blocking actor in registry order.
pub fn check_actor_collision<'a>(
    rect: &Rect,
    mover_id: &ActorId,
    mover_kind: ActorKind,
    actors: &'a EntityRegistry,
) -> Option<&'a ActorId> {
    actors
        .iter()
        .filter(|other| &other.id != mover_id)
        .filter(|other| other.blocks(mover_kind))
        .find(|other| rect.overlaps(&other.bounds()))
        .map(|other| &other.id)
}

// =============================================================================
// TESTS
// =============================================================================
