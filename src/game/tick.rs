//! Simulation Tick
//!
//! One step of the local simulation. The order is fixed:
//!
//! 1. Pin carried players to their hunters
//! 2. Move the local actor
//! 3. Hunters capture overlapping players
//! 4. Pin carried players again
//! 5. Interact and light presses become requests
//!
//! Remote actors are never moved here; only snapshots move them.

use tracing::trace;

use crate::game::actor::{ActorId, Movable};
use crate::game::capture::{apply_carry_constraint, check_captures};
use crate::game::events::{ActionRequest, SimEvent};
use crate::game::input::InputFrame;
use crate::game::motion::resolve_move;
use crate::game::state::GameState;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick, plus any queued since the last drain
    pub events: Vec<SimEvent>,
    /// Requests the session must send outward
    pub requests: Vec<ActionRequest>,
}

/// Configuration for the per-tick simulation.
#[derive(Clone, Debug)]
pub struct TickConfig {
    /// Minimum time between accepted interact presses, in seconds
    pub interact_cooldown: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interact_cooldown: 0.3,
        }
    }
}

/// Run one simulation tick of `dt` seconds.
pub fn tick(
    state: &mut GameState,
    input: InputFrame,
    dt: f64,
    config: &TickConfig,
) -> TickResult {
    let mut result = TickResult::default();

    // 0. Advance time
    state.tick += 1;
    state.elapsed += dt.max(0.0);

    // 1. Carry constraint before any movement
    apply_carry_constraint(&mut state.actors);

    // 2. Local movement
    let local_id = state.actors.local_id().cloned();
    if let Some(id) = &local_id {
        move_local(state, id, input, dt);
    }

    // 3. Capture
    for capture in check_captures(&mut state.actors) {
        state.push_event(capture.into());
    }

    // 4. Carry constraint after capture
    apply_carry_constraint(&mut state.actors);

    // 5. Actions
    if let Some(id) = &local_id {
        process_actions(state, id, input, config, &mut result);
    }

    result.events = state.take_events();
    result
}

fn move_local(state: &mut GameState, id: &ActorId, input: InputFrame, dt: f64) {
    let Some(actor) = state.actors.get(id.as_str()) else {
        return;
    };
    if !actor.can_move() {
        return;
    }

    let outcome = resolve_move(
        actor,
        input.direction(),
        dt,
        &state.map,
        &state.interactables,
        &state.actors,
    );

    if let Some(actor) = state.actors.get_mut(id.as_str()) {
        actor.set_position(outcome.position);
    }
}

fn process_actions(
    state: &mut GameState,
    id: &ActorId,
    input: InputFrame,
    config: &TickConfig,
    result: &mut TickResult,
) {
    // Carried players have no say.
    let carried = state
        .actors
        .get(id.as_str())
        .map(|a| a.is_carried)
        .unwrap_or(true);
    if carried {
        return;
    }

    if input.interact() {
        let now = state.elapsed;
        if state.interact_ready(now, config.interact_cooldown) {
            state.mark_interact(now);
            if let Some(request) = state.interact(id) {
                result.requests.push(request);
            }
        } else {
            trace!(actor = %id, "Interact ignored during cooldown");
        }
    }

    if input.toggle_light() && state.toggle_light(id).is_some() {
        result.requests.push(ActionRequest::ToggleLight);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::game::actor::{ActorKind, Actor};
    use crate::game::capture;
    use crate::game::input::{FLAG_INTERACT, FLAG_TOGGLE_LIGHT};
    use crate::game::map::{TileCoord, TileMap};

    fn open_state() -> GameState {
        let mut rows = vec![vec![0i64; 10]; 10];
        rows[4][5] = 2;
        rows[1][1] = 3;
        GameState::new(TileMap::from_codes(rows))
    }

    fn right() -> InputFrame {
        InputFrame::with_keys(false, false, false, true)
    }

    #[test]
    fn test_local_actor_moves() {
        let mut state = open_state();
        state.spawn_local(&"me".into(), Vec2::new(100.0, 100.0));
        tick(&mut state, right(), 0.1, &TickConfig::default());
        let me = state.actors.get("me").unwrap();
        assert!((me.position.x - 112.0).abs() < 1e-9);
        assert_eq!(state.tick, 1);
    }

    #[test]
    fn test_remote_actors_ignore_input() {
        let mut state = open_state();
        state.spawn_local(&"me".into(), Vec2::new(100.0, 100.0));
        state.ensure_actor(&"other".into(), ActorKind::Player, Vec2::new(300.0, 300.0));
        tick(&mut state, right(), 0.1, &TickConfig::default());
        assert_eq!(state.actors.get("other").unwrap().position, Vec2::new(300.0, 300.0));
    }

    #[test]
    fn test_carry_lock_over_ticks() {
        let mut state = open_state();
        let hunter = ActorId::from("h");
        state.spawn_local(&hunter, Vec2::new(200.0, 200.0));
        // Make the local actor a hunter.
        state.actors.get_mut("h").unwrap().kind = ActorKind::Hunter;
        state.ensure_actor(&"p".into(), ActorKind::Player, Vec2::new(210.0, 210.0));

        let result = tick(&mut state, InputFrame::IDLE, 0.016, &TickConfig::default());
        assert!(result.events.contains(&SimEvent::Captured { hunter: hunter.clone(), player: "p".into() }));

        for _ in 0..5 {
            tick(&mut state, right(), 0.05, &TickConfig::default());
            let h = state.actors.get("h").unwrap().position;
            assert_eq!(state.actors.get("p").unwrap().position, h);
        }
        assert!(state.actors.get("h").unwrap().position.x > 200.0);

        capture::release(&mut state.actors, &hunter);
        state.actors.get_mut("p").unwrap().position = Vec2::new(500.0, 500.0);
        tick(&mut state, right(), 0.05, &TickConfig::default());
        assert_eq!(state.actors.get("p").unwrap().position, Vec2::new(500.0, 500.0));
        assert!(state.actors.get("h").unwrap().carrying.is_none());
    }

    #[test]
    fn test_carried_local_player_does_not_move() {
        let mut state = open_state();
        let me = ActorId::from("me");
        state.spawn_local(&me, Vec2::new(100.0, 100.0));
        state.ensure_actor(&"h".into(), ActorKind::Hunter, Vec2::new(400.0, 400.0));
        capture::attach(&mut state.actors, &"h".into(), &me);

        let result = tick(&mut state, right().with(FLAG_INTERACT | FLAG_TOGGLE_LIGHT), 0.1, &TickConfig::default());
        assert_eq!(state.actors.get("me").unwrap().position, Vec2::new(400.0, 400.0));
        assert!(result.requests.is_empty());
    }

    #[test]
    fn test_interact_emits_door_request_without_flip() {
        let mut state = open_state();
        state.spawn_local(&"me".into(), Vec2::new(4.0 * 60.0 + 15.0, 4.0 * 60.0 + 15.0));
        let result = tick(&mut state, InputFrame::new(FLAG_INTERACT), 0.016, &TickConfig::default());
        assert_eq!(result.requests, vec![ActionRequest::ToggleDoor(TileCoord::new(5, 4))]);
        assert!(state.interactables.is_door_closed(TileCoord::new(5, 4)));
    }

    #[test]
    fn test_interact_cooldown_debounces() {
        let mut state = open_state();
        state.spawn_local(&"me".into(), Vec2::new(75.0, 75.0));
        let config = TickConfig::default();
        let press = InputFrame::new(FLAG_INTERACT);

        let first = tick(&mut state, press, 0.016, &config);
        assert_eq!(first.requests, vec![ActionRequest::ToggleHiding]);
        assert!(state.actors.get("me").unwrap().is_hidden);

        let second = tick(&mut state, press, 0.016, &config);
        assert!(second.requests.is_empty());
        assert!(state.actors.get("me").unwrap().is_hidden);

        let third = tick(&mut state, press, 0.5, &config);
        assert_eq!(third.requests, vec![ActionRequest::ToggleHiding]);
        assert!(!state.actors.get("me").unwrap().is_hidden);
    }

    #[test]
    fn test_hidden_local_actor_stays_put() {
        let mut state = open_state();
        state.spawn_local(&"me".into(), Vec2::new(75.0, 75.0));
        tick(&mut state, InputFrame::new(FLAG_INTERACT), 0.016, &TickConfig::default());
        tick(&mut state, right(), 0.1, &TickConfig::default());
        assert_eq!(state.actors.get("me").unwrap().position, Vec2::new(75.0, 75.0));
    }

    #[test]
    fn test_light_toggle_is_optimistic() {
        let mut state = open_state();
        state.spawn_local(&"me".into(), Vec2::new(100.0, 100.0));
        let result = tick(&mut state, InputFrame::new(FLAG_TOGGLE_LIGHT), 0.016, &TickConfig::default());
        assert_eq!(result.requests, vec![ActionRequest::ToggleLight]);
        assert!(!state.actors.get("me").unwrap().light_on);
    }

    #[test]
    fn test_no_local_actor_is_noop() {
        let mut state = open_state();
        state.actors.insert(Actor::player("x", Vec2::ZERO));
        let result = tick(&mut state, right().with(FLAG_INTERACT), 0.1, &TickConfig::default());
        assert!(result.requests.is_empty());
        assert_eq!(state.actors.get("x").unwrap().position, Vec2::ZERO);
    }
}
