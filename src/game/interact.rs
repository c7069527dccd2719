//! Interactable Objects
//!
//! Doors and hiding spots, keyed by tile coordinate and created once from the map.
//!
//! Door state is server-authoritative: a local toggle request only passes an
//! adjacency gate and produces an outbound request. The door itself changes
//! only when a snapshot says so.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::actor::ActorId;
use crate::game::map::{TileCoord, TileKind, TileMap};

/// Door at a tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    /// Tile coordinate (identity)
    pub coord: TileCoord,
    /// Open doors are walkable
    pub is_open: bool,
}

impl Door {
    /// Create a closed door.
    pub fn new(coord: TileCoord) -> Self {
        Self { coord, is_open: false }
    }

    /// Whether an actor standing on `actor_tile` may operate this door.
    pub fn is_near(&self, actor_tile: TileCoord) -> bool {
        is_near(actor_tile, self.coord)
    }
}

/// Door adjacency rule: Manhattan distance of exactly one.
#[inline]
pub fn is_near(actor_tile: TileCoord, door_tile: TileCoord) -> bool {
    actor_tile.is_rook_adjacent(door_tile)
}

/// Hiding spot at a tile. Holds at most one occupant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidingSpot {
    /// Tile coordinate (identity)
    pub coord: TileCoord,
    occupant: Option<ActorId>,
}

impl HidingSpot {
    /// Create a free spot.
    pub fn new(coord: TileCoord) -> Self {
        Self { coord, occupant: None }
    }

    /// Check occupancy.
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Current occupant.
    pub fn occupant(&self) -> Option<&ActorId> {
        self.occupant.as_ref()
    }

    /// FREE -> OCCUPIED. Fails if anyone is already inside.
    pub fn occupy(&mut self, id: &ActorId) -> bool {
        if self.occupant.is_some() {
            return false;
        }
        self.occupant = Some(id.clone());
        true
    }

    /// OCCUPIED -> FREE. Only the occupant may leave.
    pub fn release(&mut self, id: &ActorId) -> bool {
        if self.occupant.as_ref() != Some(id) {
            return false;
        }
        self.occupant = None;
        true
    }
}

/// Outcome of an interact on a hiding spot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HidingTransition {
    /// Actor entered the spot
    Entered,
    /// Actor left the spot
    Left,
}

/// Doors and hiding spots of one map.
#[derive(Clone, Debug, Default)]
pub struct InteractableRegistry {
    doors: BTreeMap<TileCoord, Door>,
    spots: BTreeMap<TileCoord, HidingSpot>,
}

impl InteractableRegistry {
    /// Create one door per DOOR cell and one spot per HIDING_SPOT cell.
    pub fn from_map(map: &TileMap) -> Self {
        let doors = map
            .coords_of(TileKind::Door)
            .map(|c| (c, Door::new(c)))
            .collect();
        let spots = map
            .coords_of(TileKind::HidingSpot)
            .map(|c| (c, HidingSpot::new(c)))
            .collect();
        Self { doors, spots }
    }

    // =========================================================================
    // DOORS
    // =========================================================================

    /// Door at a coordinate.
    pub fn door(&self, coord: TileCoord) -> Option<&Door> {
        self.doors.get(&coord)
    }

    /// All doors in coordinate order.
    pub fn doors(&self) -> impl Iterator<Item = &Door> + '_ {
        self.doors.values()
    }

    /// Whether the door at `coord` blocks movement. Door cells without a
    /// door entry count as closed.
    pub fn is_door_closed(&self, coord: TileCoord) -> bool {
        self.doors.get(&coord).map(|d| !d.is_open).unwrap_or(true)
    }

    /// Apply an authoritative door state. Returns `Some(changed)` when the
    /// door exists.
    pub fn set_door_open(&mut self, coord: TileCoord, is_open: bool) -> Option<bool> {
        let door = self.doors.get_mut(&coord)?;
        let changed = door.is_open != is_open;
        door.is_open = is_open;
        Some(changed)
    }

    /// Gate a toggle request. Returns the door coordinate to send outward
    /// when the actor is adjacent; leaves the door untouched either way.
    pub fn request_toggle(&self, actor_tile: TileCoord, door: TileCoord) -> Option<TileCoord> {
        match self.doors.get(&door) {
            Some(d) if d.is_near(actor_tile) => Some(door),
            Some(_) => {
                debug!(%actor_tile, %door, "Door toggle rejected: not adjacent");
                None
            }
            None => {
                debug!(%door, "Door toggle rejected: no door");
                None
            }
        }
    }

    /// First door adjacent to a tile, in coordinate order.
    pub fn adjacent_door(&self, actor_tile: TileCoord) -> Option<TileCoord> {
        self.doors
            .values()
            .find(|d| d.is_near(actor_tile))
            .map(|d| d.coord)
    }

    // =========================================================================
    // HIDING SPOTS
    // =========================================================================

    /// Spot at a coordinate.
    pub fn hiding_spot(&self, coord: TileCoord) -> Option<&HidingSpot> {
        self.spots.get(&coord)
    }

    /// All spots in coordinate order.
    pub fn hiding_spots(&self) -> impl Iterator<Item = &HidingSpot> + '_ {
        self.spots.values()
    }

    /// Occupy the spot at `coord`.
    pub fn occupy(&mut self, coord: TileCoord, id: &ActorId) -> bool {
        self.spots.get_mut(&coord).map(|s| s.occupy(id)).unwrap_or(false)
    }

    /// Release the spot at `coord`.
    pub fn release(&mut self, coord: TileCoord, id: &ActorId) -> bool {
        self.spots.get_mut(&coord).map(|s| s.release(id)).unwrap_or(false)
    }

    /// Spot held by an actor, if any.
    pub fn spot_of(&self, id: &ActorId) -> Option<TileCoord> {
        self.spots
            .values()
            .find(|s| s.occupant() == Some(id))
            .map(|s| s.coord)
    }

    /// Release whatever spot an actor holds.
    pub fn release_all(&mut self, id: &ActorId) -> Option<TileCoord> {
        let coord = self.spot_of(id)?;
        self.release(coord, id);
        Some(coord)
    }

    /// Interact with the spot under an actor: enter if free, leave if the
    /// actor is the occupant, otherwise nothing.
    pub fn toggle_hiding(&mut self, actor_tile: TileCoord, id: &ActorId) -> Option<HidingTransition> {
        let spot = self.spots.get_mut(&actor_tile)?;
        if spot.release(id) {
            Some(HidingTransition::Left)
        } else if spot.occupy(id) {
            Some(HidingTransition::Entered)
        } else {
            debug!(%actor_tile, actor = %id, "Hiding spot occupied by another actor");
            None
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> InteractableRegistry {
        // Door at (5,4), spots at (1,1) and (2,1)
        let mut rows = vec![vec![0i64; 7]; 7];
        rows[4][5] = 2;
        rows[1][1] = 3;
        rows[1][2] = 3;
        InteractableRegistry::from_map(&TileMap::from_codes(rows))
    }

    #[test]
    fn test_created_from_map() {
        let reg = registry();
        assert_eq!(reg.doors().count(), 1);
        assert_eq!(reg.hiding_spots().count(), 2);
        assert!(!reg.door(TileCoord::new(5, 4)).unwrap().is_open);
    }

    #[test]
    fn test_is_near() {
        let door = TileCoord::new(5, 4);
        assert!(is_near(TileCoord::new(4, 4), door));
        assert!(is_near(TileCoord::new(5, 5), door));
        assert!(!is_near(door, door));
        assert!(!is_near(TileCoord::new(4, 5), TileCoord::new(5, 4)));
        assert!(!is_near(TileCoord::new(3, 4), door));
    }

    #[test]
    fn test_request_toggle_does_not_flip() {
        let reg = registry();
        let door = TileCoord::new(5, 4);
        assert_eq!(reg.request_toggle(TileCoord::new(4, 4), door), Some(door));
        assert!(reg.is_door_closed(door));

        assert_eq!(reg.request_toggle(TileCoord::new(4, 5), TileCoord::new(5, 5)), None);
        assert_eq!(reg.request_toggle(TileCoord::new(4, 3), door), None);
    }

    #[test]
    fn test_set_door_open() {
        let mut reg = registry();
        let door = TileCoord::new(5, 4);
        assert_eq!(reg.set_door_open(door, true), Some(true));
        assert_eq!(reg.set_door_open(door, true), Some(false));
        assert!(!reg.is_door_closed(door));
        assert_eq!(reg.set_door_open(TileCoord::new(0, 0), true), None);
    }

    #[test]
    fn test_exclusive_hiding() {
        let mut reg = registry();
        let spot = TileCoord::new(1, 1);
        let a = ActorId::from("a");
        let b = ActorId::from("b");

        assert_eq!(reg.toggle_hiding(spot, &a), Some(HidingTransition::Entered));
        assert_eq!(reg.toggle_hiding(spot, &b), None);
        assert!(!reg.occupy(spot, &b));
        assert_eq!(reg.hiding_spot(spot).unwrap().occupant(), Some(&a));

        assert!(!reg.release(spot, &b));
        assert_eq!(reg.toggle_hiding(spot, &a), Some(HidingTransition::Left));
        assert!(!reg.hiding_spot(spot).unwrap().is_occupied());
    }

    #[test]
    fn test_toggle_off_spot_is_noop() {
        let mut reg = registry();
        assert_eq!(reg.toggle_hiding(TileCoord::new(3, 3), &ActorId::from("a")), None);
    }

    #[test]
    fn test_release_all() {
        let mut reg = registry();
        let a = ActorId::from("a");
        reg.occupy(TileCoord::new(2, 1), &a);
        assert_eq!(reg.spot_of(&a), Some(TileCoord::new(2, 1)));
        assert_eq!(reg.release_all(&a), Some(TileCoord::new(2, 1)));
        assert_eq!(reg.spot_of(&a), None);
    }

    #[test]
    fn test_adjacent_door() {
        let reg = registry();
        assert_eq!(reg.adjacent_door(TileCoord::new(5, 3)), Some(TileCoord::new(5, 4)));
        assert_eq!(reg.adjacent_door(TileCoord::new(4, 3)), None);
    }
}
