// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generic event listeners.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone};
use parking_lot::Mutex;
use tokio::time::Instant;

use super::conditions::{Conditions, ConditionsBuilder};
use super::{ListenerId, spawn_callback, unique_keys, validate_keys};
use crate::error::ListenerError;
use crate::notification::EventData;

/// Callback invoked when an event listener fires.
pub type EventCallback = Arc<dyn Fn(EventData) + Send + Sync>;

/// A listener for events of one or more types.
///
/// ```
/// use hass_rules::listener::EventListener;
///
/// let listener = EventListener::builder()
///     .event_types(["zwave_js_value_notification"])
///     .call(|event| println!("{}", event.raw_event_json()))
///     .exception_dates([chrono::NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()])
///     .build()
///     .unwrap();
/// # let _ = listener;
/// ```
pub struct EventListener {
    id: ListenerId,
    event_types: Vec<String>,
    callback: EventCallback,
    conditions: Conditions,
    last_ran: Mutex<Option<Instant>>,
}

impl EventListener {
    /// Starts building an event listener.
    #[must_use]
    pub fn builder() -> EventListenerBuilder {
        EventListenerBuilder { _private: () }
    }

    /// Returns the listener's identifier.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Returns the event types this listener is triggered by.
    #[must_use]
    pub fn event_types(&self) -> &[String] {
        &self.event_types
    }

    /// Returns the gating conditions.
    #[must_use]
    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    /// Returns when the callback last ran, if ever.
    #[must_use]
    pub fn last_ran(&self) -> Option<Instant> {
        *self.last_ran.lock()
    }

    pub(crate) fn fire(&self, data: EventData) {
        tracing::debug!(
            listener = %self.id,
            event_type = %data.event_type,
            "Firing event listener"
        );
        *self.last_ran.lock() = Some(Instant::now());
        spawn_callback(self.id, Arc::clone(&self.callback), data);
    }
}

impl std::fmt::Debug for EventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListener")
            .field("id", &self.id)
            .field("event_types", &self.event_types)
            .field("conditions", &self.conditions)
            .finish_non_exhaustive()
    }
}

/// First builder stage: choose the event types.
#[derive(Debug)]
pub struct EventListenerBuilder {
    _private: (),
}

impl EventListenerBuilder {
    /// Sets the event types that trigger the listener.
    ///
    /// Repeated types are ignored.
    #[must_use]
    pub fn event_types<I, S>(self, event_types: I) -> EventListenerWithTypes
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EventListenerWithTypes {
            event_types: unique_keys(event_types),
        }
    }
}

/// Second builder stage: choose the callback.
#[derive(Debug)]
pub struct EventListenerWithTypes {
    event_types: Vec<String>,
}

impl EventListenerWithTypes {
    /// Sets the callback invoked when the listener fires.
    #[must_use]
    pub fn call<F>(self, callback: F) -> EventListenerOptions
    where
        F: Fn(EventData) + Send + Sync + 'static,
    {
        EventListenerOptions {
            event_types: self.event_types,
            callback: Arc::new(callback),
            conditions: ConditionsBuilder::default(),
        }
    }
}

/// Final builder stage: optional conditions.
pub struct EventListenerOptions {
    event_types: Vec<String>,
    callback: EventCallback,
    conditions: ConditionsBuilder,
}

impl EventListenerOptions {
    /// Only fire between `start` and `end` (`HH:MM`, end exclusive).
    #[must_use]
    pub fn only_between(mut self, start: &str, end: &str) -> Self {
        self.conditions.only_after(start);
        self.conditions.only_before(end);
        self
    }

    /// Only fire once `start` (`HH:MM`) has been reached today.
    #[must_use]
    pub fn only_after(mut self, start: &str) -> Self {
        self.conditions.only_after(start);
        self
    }

    /// Only fire until `end` (`HH:MM`) has passed today.
    #[must_use]
    pub fn only_before(mut self, end: &str) -> Self {
        self.conditions.only_before(end);
        self
    }

    /// Fire at most once per `throttle`.
    #[must_use]
    pub fn throttle(mut self, throttle: Duration) -> Self {
        self.conditions.throttle(throttle);
        self
    }

    /// Never fire on the given calendar dates.
    #[must_use]
    pub fn exception_dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.conditions.exception_dates(dates);
        self
    }

    /// Never fire between `start` and `end` (both inclusive).
    #[must_use]
    pub fn exception_range<Tz: TimeZone>(mut self, start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        self.conditions.exception_range(start, end);
        self
    }

    /// Only fire while `entity_id` is in `state`.
    #[must_use]
    pub fn enabled_when(
        mut self,
        entity_id: impl Into<String>,
        state: impl Into<String>,
        run_on_network_error: bool,
    ) -> Self {
        self.conditions
            .enabled_when(entity_id.into(), state.into(), run_on_network_error);
        self
    }

    /// Never fire while `entity_id` is in `state`.
    #[must_use]
    pub fn disabled_when(
        mut self,
        entity_id: impl Into<String>,
        state: impl Into<String>,
        run_on_network_error: bool,
    ) -> Self {
        self.conditions
            .disabled_when(entity_id.into(), state.into(), run_on_network_error);
        self
    }

    /// Builds the listener.
    ///
    /// # Errors
    ///
    /// Returns `ListenerError` if no event type was given, or if a condition
    /// is invalid (see [`EntityListenerOptions::build`](super::EntityListenerOptions::build)).
    pub fn build(self) -> Result<EventListener, ListenerError> {
        validate_keys(&self.event_types)?;
        let conditions = self.conditions.finish()?;

        Ok(EventListener {
            id: ListenerId::new(),
            event_types: self.event_types,
            callback: self.callback,
            conditions,
            last_ran: Mutex::new(None),
        })
    }
}

impl std::fmt::Debug for EventListenerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListenerOptions")
            .field("event_types", &self.event_types)
            .finish_non_exhaustive()
    }
}
