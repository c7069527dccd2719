//! Capture and Carry
//!
//! Hunters pick up the first overlapping eligible player they find, in
//! registry order. A carried player's position is pinned to its hunter by a
//! constraint that must be re-applied every tick.

use tracing::{debug, info};

use crate::game::actor::{ActorId, Carriable, Collidable};
use crate::game::events::SimEvent;
use crate::game::registry::EntityRegistry;

/// A hunter picking up a player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capture {
    /// Hunter doing the carrying
    pub hunter: ActorId,
    /// Player being carried
    pub player: ActorId,
}

/// Scan every free hunter for an overlapping eligible player and attach the
/// first match. Players captured earlier in the same scan are skipped.
pub fn check_captures(registry: &mut EntityRegistry) -> Vec<Capture> {
    let mut captures = Vec::new();

    for hunter_id in registry.ids() {
        let hunter_box = match registry.get(hunter_id.as_str()) {
            Some(h) if h.is_hunter() && h.carrying.is_none() => h.bounds(),
            _ => continue,
        };

        let target = registry
            .iter()
            .filter(|p| p.is_capturable())
            .find(|p| p.bounds().overlaps(&hunter_box))
            .map(|p| p.id.clone());

        if let Some(player_id) = target {
            attach(registry, &hunter_id, &player_id);
            info!(hunter = %hunter_id, player = %player_id, "Player captured");
            captures.push(Capture { hunter: hunter_id, player: player_id });
        }
    }

    captures
}

/// Link a hunter and a player on both sides, clearing any previous links
/// either of them had. Returns false if either id is missing or of the
/// wrong kind.
pub fn attach(registry: &mut EntityRegistry, hunter_id: &ActorId, player_id: &ActorId) -> bool {
    let valid = matches!(registry.get(hunter_id.as_str()), Some(h) if h.is_hunter())
        && matches!(registry.get(player_id.as_str()), Some(p) if p.is_player());
    if !valid {
        return false;
    }

    release(registry, hunter_id);
    let previous = registry
        .get(player_id.as_str())
        .and_then(|p| p.carrier().cloned());
    if let Some(previous) = previous {
        release(registry, &previous);
    }

    if let Some(hunter) = registry.get_mut(hunter_id.as_str()) {
        hunter.carrying = Some(player_id.clone());
    }
    if let Some(player) = registry.get_mut(player_id.as_str()) {
        player.attach_to(hunter_id);
    }
    true
}

/// Drop whatever a hunter is carrying. Both sides are cleared
/// unconditionally. Returns the released player id.
pub fn release(registry: &mut EntityRegistry, hunter_id: &ActorId) -> Option<ActorId> {
    let player_id = registry.get_mut(hunter_id.as_str())?.carrying.take()?;
    if let Some(player) = registry.get_mut(player_id.as_str()) {
        if player.carrier() == Some(hunter_id) {
            player.detach();
        }
    }
    debug!(hunter = %hunter_id, player = %player_id, "Player released");
    Some(player_id)
}

/// Pin every carried player to its hunter's position. Links whose other
/// side has vanished are cleared.
pub fn apply_carry_constraint(registry: &mut EntityRegistry) {
    for hunter_id in registry.ids() {
        let (position, player_id) = match registry.get(hunter_id.as_str()) {
            Some(h) => match &h.carrying {
                Some(p) => (h.position, p.clone()),
                None => continue,
            },
            None => continue,
        };

        let linked = registry
            .get(player_id.as_str())
            .map(|p| p.carrier() == Some(&hunter_id))
            .unwrap_or(false);

        if linked {
            if let Some(player) = registry.get_mut(player_id.as_str()) {
                player.position = position;
            }
        } else if let Some(hunter) = registry.get_mut(hunter_id.as_str()) {
            hunter.carrying = None;
        }
    }

    // Players pointing at a hunter that no longer carries them.
    for player_id in registry.ids() {
        let stale = match registry.get(player_id.as_str()) {
            Some(p) => match p.carrier() {
                Some(h) => registry
                    .get(h.as_str())
                    .and_then(|h| h.carrying.as_ref())
                    != Some(&player_id),
                None => p.is_carried,
            },
            None => false,
        };
        if stale {
            if let Some(p) = registry.get_mut(player_id.as_str()) {
                p.detach();
            }
        }
    }
}

/// Turn a capture into the event the UI layer sees.
impl From<Capture> for SimEvent {
    fn from(c: Capture) -> Self {
        SimEvent::Captured { hunter: c.hunter, player: c.player }
    }
}

// =============================================================================
// TESTS
// =============================================================================
