// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dispatch engine.
//!
//! The [`Engine`] consumes raw notifications one at a time, looks up the
//! listeners registered for each, runs them through the condition gates and
//! invokes the callbacks of those that pass.
//!
//! # Gate order
//!
//! Entity listeners: time window, from-state, to-state, throttle, exception
//! dates, exception ranges, enabled entities, disabled entities.
//!
//! Event listeners: time window, throttle, exception dates, exception
//! ranges, enabled entities, disabled entities.
//!
//! Evaluation stops at the first failing gate. A to-state mismatch also
//! cancels the listener's pending delayed call.
//!
//! # Examples
//!
//! ```no_run
//! use hass_rules::engine::Engine;
//! use hass_rules::listener::EntityListener;
//! use hass_rules::oracle::OracleConfig;
//! use hass_rules::registry::ListenerRegistry;
//!
//! # async fn example() -> hass_rules::Result<()> {
//! let mut registry = ListenerRegistry::new();
//! registry.register_entity_listener(
//!     EntityListener::builder()
//!         .entity_ids(["light.pantry"])
//!         .call(|data| println!("pantry light: {}", data.to_state))
//!         .to_state("on")
//!         .build()?,
//! );
//!
//! let oracle = OracleConfig::new("homeassistant.local", "token").into_oracle()?;
//! let engine = Engine::new(registry, oracle);
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(64);
//! // The websocket client pushes raw messages into `tx`.
//! # drop(tx);
//! engine.run_startup_listeners().await;
//! engine.run(rx).await;
//! # Ok(())
//! # }
//! ```

mod config;

pub use config::EngineConfig;

use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::condition::{
    Gate, entities_enabled, entities_not_disabled, not_exception_date, not_in_exception_range,
    states_match, throttle_elapsed, within_time_range,
};
use crate::listener::{Conditions, EntityListener, EventListener};
use crate::notification::{EntityData, EventData, Notification, StateChanged};
use crate::oracle::{StateOracle, fetch_state};
use crate::registry::ListenerRegistry;

/// Source of the wall-clock time used by time-based gates.
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Evaluates notifications against registered listeners.
pub struct Engine<O> {
    registry: ListenerRegistry,
    oracle: O,
    config: EngineConfig,
    clock: Clock,
}

impl<O: StateOracle> Engine<O> {
    /// Creates an engine over a populated registry.
    ///
    /// The registry cannot be modified afterwards.
    pub fn new(registry: ListenerRegistry, oracle: O) -> Self {
        tracing::debug!(registry = ?registry, "Creating dispatch engine");
        Self {
            registry,
            oracle,
            config: EngineConfig::default(),
            clock: Arc::new(Local::now),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the wall clock used by time window and exception gates.
    ///
    /// Throttling and delays are measured on Tokio's monotonic clock and are
    /// not affected.
    #[must_use]
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Local> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Returns the listener registry.
    #[must_use]
    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    /// Returns the state oracle.
    #[must_use]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Intake
    // =========================================================================

    /// Processes raw messages until the channel closes.
    ///
    /// Messages are handled strictly in arrival order; callbacks run on the
    /// blocking pool and never hold up the loop.
    pub async fn run(&self, mut messages: mpsc::Receiver<String>) {
        tracing::debug!("Dispatch loop started");
        while let Some(raw) = messages.recv().await {
            self.handle_message(&raw).await;
        }
        tracing::debug!("Dispatch loop stopped, channel closed");
    }

    /// Decodes and processes one raw message.
    ///
    /// Messages that are not events, or cannot be decoded, are dropped.
    pub async fn handle_message(&self, raw: &str) {
        match Notification::decode(raw) {
            Ok(notification) => self.handle(&notification).await,
            Err(e) => tracing::trace!(error = %e, "Dropping undecodable message"),
        }
    }

    /// Processes a decoded notification.
    ///
    /// A state change is offered to the entity listeners of the changed
    /// entity and then, as a generic event, to event listeners.
    pub async fn handle(&self, notification: &Notification) {
        if let Some(change) = notification.state_change() {
            self.handle_state_changed(change).await;
        }
        self.handle_event(notification.event()).await;
    }

    // =========================================================================
    // State-change path
    // =========================================================================

    /// Evaluates entity listeners for a state transition.
    pub async fn handle_state_changed(&self, change: &StateChanged) {
        if change.is_attribute_only() {
            tracing::trace!(entity = %change.entity_id, "Ignoring attribute-only change");
            return;
        }

        let listeners = self.registry.entity_listeners_for(&change.entity_id);
        if listeners.is_empty() {
            return;
        }

        for listener in listeners {
            match self.check_entity_listener(listener, change).await {
                Ok(()) => listener.schedule(EntityData::from_change(change)),
                Err(gate) => tracing::trace!(
                    listener = %listener.id(),
                    entity = %change.entity_id,
                    gate = %gate,
                    "Entity listener gated"
                ),
            }
        }
    }

    async fn check_entity_listener(
        &self,
        listener: &EntityListener,
        change: &StateChanged,
    ) -> Result<(), Gate> {
        let conditions = listener.conditions();
        let now = (self.clock)();

        if !within_time_range(conditions.between_start, conditions.between_end, &now) {
            return Err(Gate::TimeWindow);
        }
        if !states_match(listener.from_state(), &change.old_state.state) {
            return Err(Gate::FromState);
        }
        if !states_match(listener.to_state(), &change.new_state.state) {
            listener.cancel_delay();
            return Err(Gate::ToState);
        }
        self.check_remaining(conditions, listener.last_ran(), &now)
            .await
    }

    // =========================================================================
    // Generic event path
    // =========================================================================

    /// Evaluates event listeners for an event.
    pub async fn handle_event(&self, event: &EventData) {
        let listeners = self.registry.event_listeners_for(&event.event_type);

        for listener in listeners {
            match self.check_event_listener(listener).await {
                Ok(()) => listener.fire(event.clone()),
                Err(gate) => tracing::trace!(
                    listener = %listener.id(),
                    event_type = %event.event_type,
                    gate = %gate,
                    "Event listener gated"
                ),
            }
        }
    }

    async fn check_event_listener(&self, listener: &EventListener) -> Result<(), Gate> {
        let conditions = listener.conditions();
        let now = (self.clock)();

        if !within_time_range(conditions.between_start, conditions.between_end, &now) {
            return Err(Gate::TimeWindow);
        }
        self.check_remaining(conditions, listener.last_ran(), &now)
            .await
    }

    /// Gates shared by both paths, after the time window and state filters.
    async fn check_remaining(
        &self,
        conditions: &Conditions,
        last_ran: Option<Instant>,
        now: &DateTime<Local>,
    ) -> Result<(), Gate> {
        if !throttle_elapsed(conditions.throttle, last_ran, Instant::now()) {
            return Err(Gate::Throttle);
        }
        if !not_exception_date(&conditions.exception_dates, now) {
            return Err(Gate::ExceptionDate);
        }
        if !not_in_exception_range(&conditions.exception_ranges, now) {
            return Err(Gate::ExceptionRange);
        }

        let timeout = self.config.oracle_timeout();
        if !entities_enabled(&self.oracle, &conditions.enabled_entities, timeout).await {
            return Err(Gate::EnabledEntity);
        }
        if !entities_not_disabled(&self.oracle, &conditions.disabled_entities, timeout).await {
            return Err(Gate::DisabledEntity);
        }
        Ok(())
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Runs every listener built with `run_on_startup` once.
    ///
    /// The callback receives the current state of each of the listener's
    /// entities, as both the previous and the new state. Conditions are not
    /// evaluated. Entities whose state cannot be fetched are skipped.
    ///
    /// A startup run counts as an invocation: it sets the listener's last
    /// run time, so a throttled listener stays throttled for its first state
    /// change within the throttle interval.
    ///
    /// Calling this again does not run the listeners a second time.
    pub async fn run_startup_listeners(&self) {
        let timeout = self.config.oracle_timeout();

        for listener in self.registry.entity_listeners() {
            if !listener.claim_startup_run() {
                continue;
            }

            for entity_id in listener.entity_ids() {
                match fetch_state(&self.oracle, entity_id, timeout).await {
                    Ok(state) => listener.fire(EntityData::from_current(entity_id, &state)),
                    Err(e) => tracing::warn!(
                        listener = %listener.id(),
                        entity = %entity_id,
                        error = %e,
                        "Skipping startup run, state unavailable"
                    ),
                }
            }
        }
    }
}

impl<O> std::fmt::Debug for Engine<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
