//! Game State
//!
//! Everything one client session knows about the world: the map, its doors
//! and hiding spots, every actor, and the connected roster. Owned by the
//! session and passed by reference to each system.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::core::hash::{StateHash, StateHasher};
use crate::core::vec2::Vec2;
use crate::game::actor::{Actor, ActorId, ActorKind, Carriable};
use crate::game::capture;
use crate::game::events::{ActionRequest, SimEvent};
use crate::game::interact::{HidingTransition, InteractableRegistry};
use crate::game::map::{TileCoord, TileMap};
use crate::game::registry::EntityRegistry;

/// Session-owned world view.
#[derive(Clone, Debug)]
pub struct GameState {
    /// Static tile grid
    pub map: TileMap,
    /// Doors and hiding spots
    pub interactables: InteractableRegistry,
    /// All actors, local and remote
    pub actors: EntityRegistry,
    /// Connected players as last reported (id -> username)
    pub roster: BTreeMap<ActorId, String>,
    /// Ticks simulated so far
    pub tick: u64,
    /// Simulated seconds so far
    pub elapsed: f64,
    /// When the last interact was accepted, in simulated seconds
    last_interact_at: Option<f64>,
    /// Events since the last drain
    pending_events: Vec<SimEvent>,
}

impl GameState {
    /// Create a world from a map. Doors start closed, spots start free.
    pub fn new(map: TileMap) -> Self {
        let interactables = InteractableRegistry::from_map(&map);
        Self {
            map,
            interactables,
            actors: EntityRegistry::new(),
            roster: BTreeMap::new(),
            tick: 0,
            elapsed: 0.0,
            last_interact_at: None,
            pending_events: Vec::new(),
        }
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Queue an event.
    pub fn push_event(&mut self, event: SimEvent) {
        self.pending_events.push(event);
    }

    /// Drain queued events.
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // =========================================================================
    // ACTOR LIFECYCLE
    // =========================================================================

    /// Get or create an actor, announcing creation.
    pub fn ensure_actor(&mut self, id: &ActorId, kind: ActorKind, position: Vec2) -> &mut Actor {
        if !self.actors.contains(id.as_str()) {
            debug!(actor = %id, ?kind, "Actor created");
            self.pending_events.push(SimEvent::ActorJoined { id: id.clone(), kind });
        }
        self.actors
            .get_or_insert_with(id, || Actor::new(id.clone(), kind, position))
            .0
    }

    /// Register the local player and make it the controlled actor.
    pub fn spawn_local(&mut self, id: &ActorId, position: Vec2) {
        if let Some(previous) = self.actors.local_id().cloned() {
            if &previous != id {
                self.remove_actor(&previous);
            }
        }
        self.ensure_actor(id, ActorKind::Player, position);
        self.actors.set_local(Some(id.clone()));
        info!(player = %id, "Local player spawned");
    }

    /// Drop the local actor, if any.
    pub fn clear_local(&mut self) -> Option<Actor> {
        let id = self.actors.local_id()?.clone();
        self.remove_actor(&id)
    }

    /// Remove an actor, releasing its hiding spot and any carry it is part of.
    pub fn remove_actor(&mut self, id: &ActorId) -> Option<Actor> {
        let (carrying, carrier) = {
            let actor = self.actors.get(id.as_str())?;
            (actor.carrying.is_some(), actor.carrier().cloned())
        };

        if carrying {
            if let Some(player) = capture::release(&mut self.actors, id) {
                self.pending_events.push(SimEvent::Released { hunter: id.clone(), player });
            }
        }
        if let Some(hunter) = carrier {
            if let Some(player) = capture::release(&mut self.actors, &hunter) {
                self.pending_events.push(SimEvent::Released { hunter, player });
            }
        }
        self.interactables.release_all(id);

        let removed = self.actors.remove(id.as_str());
        if removed.is_some() {
            debug!(actor = %id, "Actor removed");
            self.pending_events.push(SimEvent::ActorLeft { id: id.clone() });
        }
        removed
    }

    // =========================================================================
    // HIDING
    // =========================================================================

    /// Local interact on a hiding spot: enter if free, leave if occupant.
    /// Only players hide.
    pub fn toggle_hiding(&mut self, id: &ActorId) -> Option<HidingTransition> {
        let actor = self.actors.get(id.as_str())?;
        if !actor.is_player() {
            debug!(actor = %id, "Hunters cannot hide");
            return None;
        }
        let tile = actor.tile();
        let transition = self.interactables.toggle_hiding(tile, id)?;
        let hidden = transition == HidingTransition::Entered;
        if let Some(actor) = self.actors.get_mut(id.as_str()) {
            actor.is_hidden = hidden;
        }
        self.pending_events.push(SimEvent::HidingChanged {
            id: id.clone(),
            hidden,
            spot: Some(tile),
        });
        Some(transition)
    }

    /// Apply an authoritative hidden flag. Entering takes the spot at the
    /// actor's tile when it is free; leaving frees whatever spot it held.
    /// Hunters and carried players cannot hide. Returns whether the flag
    /// changed.
    pub fn set_hidden(&mut self, id: &ActorId, hidden: bool) -> bool {
        let (tile, was_hidden, can_hide) = match self.actors.get(id.as_str()) {
            Some(actor) => (actor.tile(), actor.is_hidden, actor.is_player() && !actor.is_carried),
            None => return false,
        };
        if was_hidden == hidden {
            return false;
        }
        if hidden && !can_hide {
            debug!(actor = %id, "Ignoring hide for a hunter or carried player");
            return false;
        }

        let spot = if hidden {
            self.interactables.occupy(tile, id).then_some(tile)
        } else {
            self.interactables.release_all(id)
        };
        if let Some(actor) = self.actors.get_mut(id.as_str()) {
            actor.is_hidden = hidden;
        }
        self.pending_events.push(SimEvent::HidingChanged { id: id.clone(), hidden, spot });
        true
    }

    // =========================================================================
    // DOORS, LIGHTS AND INTERACT ROUTING
    // =========================================================================

    /// Adjacency-gated door request. Never changes the door itself.
    pub fn request_door_toggle(&self, id: &ActorId, door: TileCoord) -> Option<TileCoord> {
        let tile = self.actors.get(id.as_str())?.tile();
        self.interactables.request_toggle(tile, door)
    }

    /// Route an interact press: for a player, a hiding spot under it wins;
    /// otherwise the first adjacent door.
    pub fn interact(&mut self, id: &ActorId) -> Option<ActionRequest> {
        let (tile, is_player) = {
            let actor = self.actors.get(id.as_str())?;
            (actor.tile(), actor.is_player())
        };
        if is_player && self.interactables.hiding_spot(tile).is_some() {
            return self
                .toggle_hiding(id)
                .map(|_| ActionRequest::ToggleHiding);
        }
        let door = self.interactables.adjacent_door(tile)?;
        self.request_door_toggle(id, door).map(ActionRequest::ToggleDoor)
    }

    /// Whether an interact at `now` clears the cooldown.
    pub fn interact_ready(&self, now: f64, cooldown: f64) -> bool {
        self.last_interact_at
            .map(|last| now - last >= cooldown)
            .unwrap_or(true)
    }

    /// Start the interact cooldown.
    pub fn mark_interact(&mut self, now: f64) {
        self.last_interact_at = Some(now);
    }

    /// Set an actor's light. Returns whether it changed.
    pub fn set_light(&mut self, id: &ActorId, on: bool) -> bool {
        let Some(actor) = self.actors.get_mut(id.as_str()) else {
            return false;
        };
        if actor.light_on == on {
            return false;
        }
        actor.light_on = on;
        self.pending_events.push(SimEvent::LightChanged { id: id.clone(), on });
        true
    }

    /// Flip an actor's light. Returns the new state.
    pub fn toggle_light(&mut self, id: &ActorId) -> Option<bool> {
        let on = !self.actors.get(id.as_str())?.light_on;
        self.set_light(id, on);
        Some(on)
    }

    // =========================================================================
    // DIGEST
    // =========================================================================

    /// Digest of actors, doors and spots. Independent of insertion order,
    /// tick count and which actor is local.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_world_state();

        let mut actors: Vec<&Actor> = self.actors.iter().collect();
        actors.sort_by(|a, b| a.id.cmp(&b.id));
        hasher.update_u32(actors.len() as u32);
        for actor in actors {
            hasher.update_str(actor.id.as_str());
            hasher.update_u8(actor.kind as u8);
            hasher.update_vec2(actor.position);
            hasher.update_bool(actor.is_hidden);
            hasher.update_bool(actor.is_carried);
            hasher.update_opt_str(actor.carried_by.as_ref().map(ActorId::as_str));
            hasher.update_opt_str(actor.carrying.as_ref().map(ActorId::as_str));
            hasher.update_bool(actor.light_on);
        }

        for door in self.interactables.doors() {
            hasher.update_i32(door.coord.x);
            hasher.update_i32(door.coord.y);
            hasher.update_bool(door.is_open);
        }

        for spot in self.interactables.hiding_spots() {
            hasher.update_i32(spot.coord.x);
            hasher.update_i32(spot.coord.y);
            hasher.update_opt_str(spot.occupant().map(ActorId::as_str));
        }

        hasher.finalize()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// 8x8 floor, door at (5,4), hiding spot at (1,1).
    fn test_state() -> GameState {
        let mut rows = vec![vec![0i64; 8]; 8];
        rows[4][5] = 2;
        rows[1][1] = 3;
        GameState::new(TileMap::from_codes(rows))
    }

    /// Pixel position that puts an actor's centre on a tile.
    fn on_tile(x: i32, y: i32) -> Vec2 {
        Vec2::new(x as f64 * 60.0 + 15.0, y as f64 * 60.0 + 15.0)
    }

    #[test]
    fn test_spawn_and_clear_local() {
        let mut state = test_state();
        let me = ActorId::from("me");
        state.spawn_local(&me, on_tile(2, 2));
        assert!(state.actors.is_local("me"));
        assert!(matches!(state.take_events().as_slice(), [SimEvent::ActorJoined { .. }]));

        assert!(state.clear_local().is_some());
        assert!(state.actors.local().is_none());
        assert!(state.actors.is_empty());
    }

    #[test]
    fn test_toggle_hiding_round_trip() {
        let mut state = test_state();
        let me = ActorId::from("me");
        state.spawn_local(&me, on_tile(1, 1));

        assert_eq!(state.toggle_hiding(&me), Some(HidingTransition::Entered));
        assert!(state.actors.get("me").unwrap().is_hidden);
        assert!(state.interactables.hiding_spot(TileCoord::new(1, 1)).unwrap().is_occupied());

        assert_eq!(state.toggle_hiding(&me), Some(HidingTransition::Left));
        assert!(!state.actors.get("me").unwrap().is_hidden);
        assert!(!state.interactables.hiding_spot(TileCoord::new(1, 1)).unwrap().is_occupied());
    }

    #[test]
    fn test_second_actor_cannot_enter_occupied_spot() {
        let mut state = test_state();
        let a = ActorId::from("a");
        let b = ActorId::from("b");
        state.ensure_actor(&a, ActorKind::Player, on_tile(1, 1));
        state.ensure_actor(&b, ActorKind::Player, on_tile(1, 1));

        state.toggle_hiding(&a);
        assert_eq!(state.toggle_hiding(&b), None);
        assert!(!state.actors.get("b").unwrap().is_hidden);
        assert_eq!(
            state.interactables.hiding_spot(TileCoord::new(1, 1)).unwrap().occupant(),
            Some(&a)
        );
    }

    #[test]
    fn test_carried_actor_cannot_hide() {
        let mut state = test_state();
        let p = ActorId::from("p");
        let h = ActorId::from("h");
        state.ensure_actor(&p, ActorKind::Player, on_tile(1, 1));
        state.ensure_actor(&h, ActorKind::Hunter, on_tile(1, 1));
        capture::attach(&mut state.actors, &h, &p);

        assert!(!state.set_hidden(&p, true));
        assert!(!state.actors.get("p").unwrap().is_hidden);
        assert!(!state.interactables.hiding_spot(TileCoord::new(1, 1)).unwrap().is_occupied());
    }

    #[test]
    fn test_hunters_cannot_hide() {
        let mut state = test_state();
        let h = ActorId::from("h");
        state.spawn_local(&h, on_tile(1, 1));
        state.actors.get_mut("h").unwrap().kind = ActorKind::Hunter;

        assert_eq!(state.toggle_hiding(&h), None);
        assert_eq!(state.interact(&h), None);
        assert!(!state.set_hidden(&h, true));
        assert!(!state.actors.get("h").unwrap().is_hidden);
        assert!(!state.interactables.hiding_spot(TileCoord::new(1, 1)).unwrap().is_occupied());
    }

    #[test]
    fn test_interact_routing() {
        let mut state = test_state();
        let me = ActorId::from("me");

        state.spawn_local(&me, on_tile(4, 4));
        assert_eq!(state.interact(&me), Some(ActionRequest::ToggleDoor(TileCoord::new(5, 4))));
        // Request only; the door stays closed.
        assert!(state.interactables.is_door_closed(TileCoord::new(5, 4)));

        state.actors.get_mut("me").unwrap().position = on_tile(4, 5);
        assert_eq!(state.interact(&me), None);

        state.actors.get_mut("me").unwrap().position = on_tile(1, 1);
        assert_eq!(state.interact(&me), Some(ActionRequest::ToggleHiding));
    }

    #[test]
    fn test_remove_actor_releases_links() {
        let mut state = test_state();
        let h = ActorId::from("h");
        let p = ActorId::from("p");
        let q = ActorId::from("q");
        state.ensure_actor(&h, ActorKind::Hunter, on_tile(3, 3));
        state.ensure_actor(&p, ActorKind::Player, on_tile(3, 3));
        state.ensure_actor(&q, ActorKind::Player, on_tile(1, 1));
        capture::attach(&mut state.actors, &h, &p);
        state.set_hidden(&q, true);

        state.remove_actor(&p);
        assert!(state.actors.get("h").unwrap().carrying.is_none());

        state.remove_actor(&q);
        assert!(!state.interactables.hiding_spot(TileCoord::new(1, 1)).unwrap().is_occupied());
    }

    #[test]
    fn test_interact_cooldown() {
        let mut state = test_state();
        assert!(state.interact_ready(0.0, 0.3));
        state.mark_interact(1.0);
        assert!(!state.interact_ready(1.2, 0.3));
        assert!(state.interact_ready(1.3, 0.3));
    }

    #[test]
    fn test_lights() {
        let mut state = test_state();
        let me = ActorId::from("me");
        state.spawn_local(&me, on_tile(2, 2));
        assert_eq!(state.toggle_light(&me), Some(false));
        assert!(!state.set_light(&me, false));
        assert!(state.set_light(&me, true));
    }

    #[test]
    fn test_hash_ignores_insertion_order() {
        let mut a = test_state();
        let mut b = test_state();
        a.ensure_actor(&"x".into(), ActorKind::Player, Vec2::new(1.0, 2.0));
        a.ensure_actor(&"y".into(), ActorKind::Hunter, Vec2::new(3.0, 4.0));
        b.ensure_actor(&"y".into(), ActorKind::Hunter, Vec2::new(3.0, 4.0));
        b.ensure_actor(&"x".into(), ActorKind::Player, Vec2::new(1.0, 2.0));
        assert_eq!(a.compute_hash(), b.compute_hash());

        b.interactables.set_door_open(TileCoord::new(5, 4), true);
        assert_ne!(a.compute_hash(), b.compute_hash());
    }
}
