//! Snapshot Reconciliation
//!
//! Applies authoritative snapshots and roster updates to the local world view,
//! and rate-limits outbound position reports.
//!
//! Snapshots are last-write-wins: each field present overwrites what the
//! client had, and nothing is buffered or merged. Snapshots never remove
//! actors; only a roster update does.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::core::vec2::Vec2;
use crate::game::actor::{ActorId, ActorKind, DEFAULT_SPAWN};
use crate::game::capture;
use crate::game::events::SimEvent;
use crate::game::map::TileCoord;
use crate::game::state::GameState;
use crate::network::protocol::{ProtocolError, StateMessage};

// =============================================================================
// VALIDATED SNAPSHOT
// =============================================================================

/// Hunter entry of a snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct HunterSnapshot {
    /// Hunter position
    pub position: Vec2,
    /// Carried player
    pub carrying: Option<ActorId>,
}

/// A fully parsed `state` message. Building one never touches the world,
/// so a bad field rejects the whole message before anything is applied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// Actor positions
    pub positions: Vec<(ActorId, Vec2)>,
    /// Door states
    pub doors: Vec<(TileCoord, bool)>,
    /// Light states
    pub lights: Option<Vec<(ActorId, bool)>>,
    /// Complete hidden set
    pub hidden: Option<BTreeSet<ActorId>>,
    /// Hunter states
    pub hunters: Option<Vec<(ActorId, HunterSnapshot)>>,
}

impl TryFrom<StateMessage> for Snapshot {
    type Error = ProtocolError;

    fn try_from(msg: StateMessage) -> Result<Self, Self::Error> {
        let doors = msg
            .doors
            .into_iter()
            .map(|(key, open)| {
                key.parse::<TileCoord>()
                    .map(|c| (c, open))
                    .map_err(|e| ProtocolError::Malformed(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let finite = |x: f64, y: f64| -> Result<Vec2, ProtocolError> {
            if x.is_finite() && y.is_finite() {
                Ok(Vec2::new(x, y))
            } else {
                Err(ProtocolError::Malformed("non-finite position".to_string()))
            }
        };

        let positions = msg
            .positions
            .into_iter()
            .map(|(id, p)| Ok((ActorId::from(id), finite(p.x, p.y)?)))
            .collect::<Result<Vec<_>, ProtocolError>>()?;

        let hunters = match msg.hunters {
            Some(hunters) => Some(
                hunters
                    .into_iter()
                    .map(|(id, h)| {
                        Ok((
                            ActorId::from(id),
                            HunterSnapshot {
                                position: finite(h.x, h.y)?,
                                carrying: h.carrying.map(ActorId::from),
                            },
                        ))
                    })
                    .collect::<Result<Vec<_>, ProtocolError>>()?,
            ),
            None => None,
        };

        Ok(Self {
            positions,
            doors,
            lights: msg
                .lights
                .map(|l| l.into_iter().map(|(id, on)| (ActorId::from(id), on)).collect()),
            hidden: msg
                .hidden
                .map(|h| h.into_iter().map(ActorId::from).collect()),
            hunters,
        })
    }
}

// =============================================================================
// APPLY
// =============================================================================

/// Apply a snapshot to the world view.
///
/// The local actor's position is never taken from a snapshot, and the hidden
/// set only governs remote actors; the local player's hiding is predicted
/// locally. Everything else applies to local and remote alike.
pub fn apply_snapshot(state: &mut GameState, snapshot: &Snapshot) {
    // Positions
    for (id, position) in &snapshot.positions {
        if state.actors.is_local(id.as_str()) {
            continue;
        }
        state.ensure_actor(id, ActorKind::Player, *position).position = *position;
    }

    // Doors
    for (coord, open) in &snapshot.doors {
        match state.interactables.set_door_open(*coord, *open) {
            Some(true) => {
                debug!(door = %coord, open, "Door changed");
                state.push_event(SimEvent::DoorChanged { door: *coord, is_open: *open });
            }
            Some(false) => {}
            None => warn!(door = %coord, "Snapshot names a door that is not on the map"),
        }
    }

    // Lights
    if let Some(lights) = &snapshot.lights {
        for (id, on) in lights {
            if !state.actors.contains(id.as_str()) {
                state.ensure_actor(id, ActorKind::Player, DEFAULT_SPAWN);
            }
            state.set_light(id, *on);
        }
    }

    // Hidden set (full replacement over remote actors)
    if let Some(hidden) = &snapshot.hidden {
        for id in state.actors.remote_ids() {
            state.set_hidden(&id, hidden.contains(&id));
        }
    }

    // Hunters
    if let Some(hunters) = &snapshot.hunters {
        for (id, hunter) in hunters {
            apply_hunter(state, id, hunter);
        }
    }

    capture::apply_carry_constraint(&mut state.actors);
}

fn apply_hunter(state: &mut GameState, id: &ActorId, snap: &HunterSnapshot) {
    let is_local = state.actors.is_local(id.as_str());
    let actor = state.ensure_actor(id, ActorKind::Hunter, snap.position);
    if !is_local {
        actor.position = snap.position;
    }
    if actor.kind != ActorKind::Hunter {
        // Was seen as a player first; it can no longer hide or be carried.
        state.set_hidden(id, false);
        if let Some(carrier) = state.actors.get(id.as_str()).and_then(|a| a.carried_by.clone()) {
            if let Some(player) = capture::release(&mut state.actors, &carrier) {
                state.push_event(SimEvent::Released { hunter: carrier, player });
            }
        }
        if let Some(actor) = state.actors.get_mut(id.as_str()) {
            actor.kind = ActorKind::Hunter;
        }
    }
    let previous = state.actors.get(id.as_str()).and_then(|a| a.carrying.clone());

    if previous == snap.carrying {
        return;
    }

    if let Some(player) = capture::release(&mut state.actors, id) {
        state.push_event(SimEvent::Released { hunter: id.clone(), player });
    }

    if let Some(player) = &snap.carrying {
        // A carried player is never hidden; drop any spot it held first.
        state.set_hidden(player, false);
        if capture::attach(&mut state.actors, id, player) {
            state.push_event(SimEvent::Captured { hunter: id.clone(), player: player.clone() });
        } else {
            debug!(hunter = %id, player = %player, "Hunter carries an unknown player");
        }
    }
}

/// Replace the connected roster and prune remote players missing from it.
pub fn apply_roster(state: &mut GameState, roster: BTreeMap<ActorId, String>) {
    let stale: Vec<ActorId> = state
        .actors
        .iter()
        .filter(|a| a.is_player() && !state.actors.is_local(a.id.as_str()))
        .filter(|a| !roster.contains_key(&a.id))
        .map(|a| a.id.clone())
        .collect();

    for id in stale {
        debug!(player = %id, "Pruning player absent from roster");
        state.remove_actor(&id);
    }

    let count = roster.len();
    state.roster = roster;
    state.push_event(SimEvent::RosterUpdated { count });
}

// =============================================================================
// POSITION REPORTER
// =============================================================================

/// Dead-reckoning gate for outbound position reports: at most one per
/// interval, and only when the position changed since the last report that
/// actually went out.
#[derive(Clone, Debug)]
pub struct PositionReporter {
    min_interval: f64,
    last_sent_at: Option<f64>,
    last_sent: Option<Vec2>,
}

impl PositionReporter {
    /// Create a reporter with a minimum interval in seconds.
    pub fn new(min_interval: f64) -> Self {
        Self { min_interval, last_sent_at: None, last_sent: None }
    }

    /// Forget history so the next report always goes out.
    pub fn reset(&mut self) {
        self.last_sent_at = None;
        self.last_sent = None;
    }

    /// Whether a report of `position` is due at `now`.
    pub fn is_due(&self, now: f64, position: Vec2) -> bool {
        let interval_elapsed = self
            .last_sent_at
            .map(|t| now - t >= self.min_interval)
            .unwrap_or(true);
        let changed = self
            .last_sent
            .map(|p| !p.approx_eq(position))
            .unwrap_or(true);
        interval_elapsed && changed
    }

    /// Record a report that was actually sent.
    pub fn mark_sent(&mut self, now: f64, position: Vec2) {
        self.last_sent_at = Some(now);
        self.last_sent = Some(position);
    }

    /// Last position that went out.
    pub fn last_sent(&self) -> Option<Vec2> {
        self.last_sent
    }
}

// =============================================================================
// TESTS
// =============================================================================
