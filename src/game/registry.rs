//! Entity Registry
//!
//! Owns every actor the session knows about. Iteration follows insertion
//! order, which is also the order capture scans players in.

use std::collections::HashMap;

use crate::game::actor::{Actor, ActorId};

/// Insertion-ordered actor store with an optional local actor.
#[derive(Clone, Debug, Default)]
pub struct EntityRegistry {
    order: Vec<ActorId>,
    actors: HashMap<ActorId, Actor>,
    local: Option<ActorId>,
}

impl EntityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of actors.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Check membership.
    pub fn contains(&self, id: &str) -> bool {
        self.actors.contains_key(id)
    }

    /// Get an actor.
    pub fn get(&self, id: &str) -> Option<&Actor> {
        self.actors.get(id)
    }

    /// Get an actor mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Actor> {
        self.actors.get_mut(id)
    }

    /// Insert an actor. Replacing an existing id keeps its original slot.
    pub fn insert(&mut self, actor: Actor) -> Option<Actor> {
        let id = actor.id.clone();
        let previous = self.actors.insert(id.clone(), actor);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    /// Get an actor, creating it with `make` when absent.
    /// Returns the actor and whether it was just created.
    pub fn get_or_insert_with(
        &mut self,
        id: &ActorId,
        make: impl FnOnce() -> Actor,
    ) -> (&mut Actor, bool) {
        let created = !self.actors.contains_key(id.as_str());
        if created {
            self.order.push(id.clone());
        }
        let actor = self.actors.entry(id.clone()).or_insert_with(make);
        (actor, created)
    }

    /// Remove an actor. Clears the local designation if it pointed here.
    pub fn remove(&mut self, id: &str) -> Option<Actor> {
        let actor = self.actors.remove(id)?;
        self.order.retain(|other| other.as_str() != id);
        if self.local.as_ref().map(ActorId::as_str) == Some(id) {
            self.local = None;
        }
        Some(actor)
    }

    /// Actors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Actor> + '_ {
        self.order.iter().filter_map(move |id| self.actors.get(id))
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> Vec<ActorId> {
        self.order.clone()
    }

    // =========================================================================
    // LOCAL ACTOR
    // =========================================================================

    /// Designate the local actor. The actor must already be registered.
    pub fn set_local(&mut self, id: Option<ActorId>) -> bool {
        match id {
            Some(id) if !self.actors.contains_key(&id) => false,
            other => {
                self.local = other;
                true
            }
        }
    }

    /// Id of the local actor.
    pub fn local_id(&self) -> Option<&ActorId> {
        self.local.as_ref()
    }

    /// Check whether an id is the local actor.
    pub fn is_local(&self, id: &str) -> bool {
        self.local.as_ref().map(ActorId::as_str) == Some(id)
    }

    /// Local actor.
    pub fn local(&self) -> Option<&Actor> {
        self.local.as_ref().and_then(|id| self.actors.get(id))
    }

    /// Local actor, mutably.
    pub fn local_mut(&mut self) -> Option<&mut Actor> {
        let id = self.local.as_ref()?;
        self.actors.get_mut(id)
    }

    /// Ids of every non-local actor, in insertion order.
    pub fn remote_ids(&self) -> Vec<ActorId> {
        self.order
            .iter()
            .filter(|id| !self.is_local(id.as_str()))
            .cloned()
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
