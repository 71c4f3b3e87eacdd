// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry mapping trigger keys to listeners.
//!
//! Listeners are registered before the engine starts. A listener with
//! several trigger keys is shared (through an `Arc`) by every key's list, so
//! its runtime state is the same whichever key triggered it.
//!
//! The registry is moved into the [`Engine`](crate::engine::Engine) and is
//! read-only from then on.

use std::collections::HashMap;
use std::sync::Arc;

use crate::listener::{EntityListener, EventListener};

/// Registry of entity and event listeners, keyed by trigger.
///
/// Within one key, listeners are kept in registration order; the engine
/// evaluates them in that order.
#[derive(Default)]
pub struct ListenerRegistry {
    /// Entity ID to listeners.
    entity_listeners: HashMap<String, Vec<Arc<EntityListener>>>,
    /// Event type to listeners.
    event_listeners: HashMap<String, Vec<Arc<EventListener>>>,
    /// Every entity listener once, in registration order.
    all_entity_listeners: Vec<Arc<EntityListener>>,
    /// Number of event listeners registered.
    event_listener_count: usize,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers an entity listener under each of its entity IDs.
    ///
    /// Returns the shared handle, which can be used to inspect the
    /// listener's runtime state.
    pub fn register_entity_listener(&mut self, listener: EntityListener) -> Arc<EntityListener> {
        let listener = Arc::new(listener);
        for entity_id in listener.entity_ids() {
            self.entity_listeners
                .entry(entity_id.clone())
                .or_default()
                .push(Arc::clone(&listener));
        }
        self.all_entity_listeners.push(Arc::clone(&listener));

        tracing::debug!(
            listener = %listener.id(),
            entity_ids = ?listener.entity_ids(),
            "Registered entity listener"
        );
        listener
    }

    /// Registers an event listener under each of its event types.
    pub fn register_event_listener(&mut self, listener: EventListener) -> Arc<EventListener> {
        let listener = Arc::new(listener);
        for event_type in listener.event_types() {
            self.event_listeners
                .entry(event_type.clone())
                .or_default()
                .push(Arc::clone(&listener));
        }
        self.event_listener_count += 1;

        tracing::debug!(
            listener = %listener.id(),
            event_types = ?listener.event_types(),
            "Registered event listener"
        );
        listener
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Returns the listeners for `entity_id`, in registration order.
    #[must_use]
    pub fn entity_listeners_for(&self, entity_id: &str) -> &[Arc<EntityListener>] {
        self.entity_listeners
            .get(entity_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Returns the listeners for `event_type`, in registration order.
    #[must_use]
    pub fn event_listeners_for(&self, event_type: &str) -> &[Arc<EventListener>] {
        self.event_listeners
            .get(event_type)
            .map_or(&[], Vec::as_slice)
    }

    /// Iterates over every entity listener once, in registration order.
    pub fn entity_listeners(&self) -> impl Iterator<Item = &Arc<EntityListener>> {
        self.all_entity_listeners.iter()
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Returns the number of registered entity listeners.
    #[must_use]
    pub fn entity_listener_count(&self) -> usize {
        self.all_entity_listeners.len()
    }

    /// Returns the number of registered event listeners.
    #[must_use]
    pub fn event_listener_count(&self) -> usize {
        self.event_listener_count
    }

    /// Returns `true` if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entity_listener_count() == 0 && self.event_listener_count() == 0
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("entity_listeners", &self.entity_listener_count())
            .field("event_listeners", &self.event_listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{EntityData, EventData};

    fn entity(ids: &[&str]) -> EntityListener {
        EntityListener::builder()
            .entity_ids(ids.iter().copied())
            .call(|_: EntityData| {})
            .build()
            .unwrap()
    }

    fn event(types: &[&str]) -> EventListener {
        EventListener::builder()
            .event_types(types.iter().copied())
            .call(|_: EventData| {})
            .build()
            .unwrap()
    }

    #[test]
    fn new_is_empty() {
        let registry = ListenerRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.entity_listeners_for("light.pantry").is_empty());
        assert!(registry.event_listeners_for("call_service").is_empty());
    }

    #[test]
    fn entity_listener_registered_under_each_key() {
        let mut registry = ListenerRegistry::new();
        let listener = registry.register_entity_listener(entity(&["light.a", "light.b"]));

        assert_eq!(registry.entity_listener_count(), 1);
        assert!(Arc::ptr_eq(&registry.entity_listeners_for("light.a")[0], &listener));
        assert!(Arc::ptr_eq(&registry.entity_listeners_for("light.b")[0], &listener));
        assert!(registry.entity_listeners_for("light.c").is_empty());
    }

    #[test]
    fn preserves_registration_order() {
        let mut registry = ListenerRegistry::new();
        let first = registry.register_entity_listener(entity(&["light.pantry"]));
        let second = registry.register_entity_listener(entity(&["light.pantry", "light.hall"]));
        let third = registry.register_entity_listener(entity(&["light.pantry"]));

        let ids: Vec<_> = registry
            .entity_listeners_for("light.pantry")
            .iter()
            .map(|l| l.id())
            .collect();
        assert_eq!(ids, vec![first.id(), second.id(), third.id()]);

        let all: Vec<_> = registry.entity_listeners().map(|l| l.id()).collect();
        assert_eq!(all, ids);
    }

    #[test]
    fn repeated_key_registers_once() {
        let mut registry = ListenerRegistry::new();
        registry.register_entity_listener(entity(&["light.pantry", "light.pantry"]));
        registry.register_event_listener(event(&["call_service", "call_service"]));

        assert_eq!(registry.entity_listeners_for("light.pantry").len(), 1);
        assert_eq!(registry.event_listeners_for("call_service").len(), 1);
    }

    #[test]
    fn event_listeners_by_type() {
        let mut registry = ListenerRegistry::new();
        registry.register_event_listener(event(&["call_service"]));
        registry.register_event_listener(event(&["call_service", "state_changed"]));

        assert_eq!(registry.event_listener_count(), 2);
        assert_eq!(registry.event_listeners_for("call_service").len(), 2);
        assert_eq!(registry.event_listeners_for("state_changed").len(), 1);
        assert!(!registry.is_empty());
    }

    #[test]
    fn debug_shows_counts() {
        let mut registry = ListenerRegistry::new();
        registry.register_entity_listener(entity(&["light.a"]));
        let debug = format!("{registry:?}");
        assert!(debug.contains("entity_listeners: 1"));
        assert!(debug.contains("event_listeners: 0"));
    }
}
