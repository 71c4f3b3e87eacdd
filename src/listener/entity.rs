// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity state-change listeners.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone};
use parking_lot::Mutex;
use tokio::time::Instant;

use super::conditions::{Conditions, ConditionsBuilder};
use super::{DelayTimer, ListenerId, spawn_callback, unique_keys, validate_keys};
use crate::error::ListenerError;
use crate::notification::EntityData;

/// Callback invoked when an entity listener fires.
pub type EntityCallback = Arc<dyn Fn(EntityData) + Send + Sync>;

/// A listener for state changes of one or more entities.
///
/// Built with [`EntityListener::builder`]. See the [module docs](super) for
/// an example.
pub struct EntityListener {
    id: ListenerId,
    entity_ids: Vec<String>,
    callback: EntityCallback,
    from_state: String,
    to_state: String,
    delay: Duration,
    run_on_startup: bool,
    conditions: Conditions,

    last_ran: Mutex<Option<Instant>>,
    delay_timer: DelayTimer,
    startup_completed: AtomicBool,
}

impl EntityListener {
    /// Starts building an entity listener.
    #[must_use]
    pub fn builder() -> EntityListenerBuilder {
        EntityListenerBuilder { _private: () }
    }

    /// Returns the listener's identifier.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Returns the entity IDs this listener is triggered by.
    #[must_use]
    pub fn entity_ids(&self) -> &[String] {
        &self.entity_ids
    }

    /// Returns the required previous state, or `""` for any.
    #[must_use]
    pub fn from_state(&self) -> &str {
        &self.from_state
    }

    /// Returns the required new state, or `""` for any.
    #[must_use]
    pub fn to_state(&self) -> &str {
        &self.to_state
    }

    /// Returns how long a matching change must hold before the callback runs.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns `true` if the listener runs once when the engine starts.
    #[must_use]
    pub fn runs_on_startup(&self) -> bool {
        self.run_on_startup
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

    /// Returns `true` if a delayed invocation is pending.
    #[must_use]
    pub fn has_pending_delay(&self) -> bool {
        self.delay_timer.is_pending()
    }

    /// Invokes the callback now and records the invocation time.
    pub(crate) fn fire(&self, data: EntityData) {
        tracing::debug!(
            listener = %self.id,
            entity = %data.trigger_entity_id,
            from = %data.from_state,
            to = %data.to_state,
            "Firing entity listener"
        );
        *self.last_ran.lock() = Some(Instant::now());
        spawn_callback(self.id, Arc::clone(&self.callback), data);
    }

    /// Fires immediately, or arms the delay timer if a delay is configured.
    ///
    /// The timer keeps a handle to this listener so the invocation time is
    /// recorded on the registered instance.
    pub(crate) fn schedule(self: &Arc<Self>, data: EntityData) {
        if self.delay.is_zero() {
            self.fire(data);
            return;
        }

        tracing::debug!(
            listener = %self.id,
            entity = %data.trigger_entity_id,
            delay_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX),
            "Arming delay timer"
        );
        let listener = Arc::clone(self);
        self.delay_timer
            .arm(self.delay, move || listener.fire(data));
    }

    /// Cancels a pending delayed invocation.
    ///
    /// Returns `true` if one was pending.
    pub(crate) fn cancel_delay(&self) -> bool {
        let cancelled = self.delay_timer.cancel();
        if cancelled {
            tracing::debug!(listener = %self.id, "Cancelled pending delay timer");
        }
        cancelled
    }

    /// Claims the one-shot startup run.
    ///
    /// Returns `true` exactly once, and only if `run_on_startup` was set.
    pub(crate) fn claim_startup_run(&self) -> bool {
        self.run_on_startup
            && self
                .startup_completed
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }
}

impl std::fmt::Debug for EntityListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityListener")
            .field("id", &self.id)
            .field("entity_ids", &self.entity_ids)
            .field("from_state", &self.from_state)
            .field("to_state", &self.to_state)
            .field("delay", &self.delay)
            .field("run_on_startup", &self.run_on_startup)
            .field("conditions", &self.conditions)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Builder stages
// =============================================================================

/// First builder stage: choose the entity IDs.
#[derive(Debug)]
pub struct EntityListenerBuilder {
    _private: (),
}

impl EntityListenerBuilder {
    /// Sets the entity IDs that trigger the listener.
    ///
    /// At least one non-empty ID is required; this is checked by `build()`.
    /// Repeated IDs are ignored.
    #[must_use]
    pub fn entity_ids<I, S>(self, entity_ids: I) -> EntityListenerWithIds
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EntityListenerWithIds {
            entity_ids: unique_keys(entity_ids),
        }
    }
}

/// Second builder stage: choose the callback.
#[derive(Debug)]
pub struct EntityListenerWithIds {
    entity_ids: Vec<String>,
}

impl EntityListenerWithIds {
    /// Sets the callback invoked when the listener fires.
    ///
    /// The callback runs on a blocking thread, so it may block or do
    /// synchronous I/O without holding up other listeners.
    #[must_use]
    pub fn call<F>(self, callback: F) -> EntityListenerOptions
    where
        F: Fn(EntityData) + Send + Sync + 'static,
    {
        EntityListenerOptions {
            entity_ids: self.entity_ids,
            callback: Arc::new(callback),
            from_state: String::new(),
            to_state: String::new(),
            delay: Duration::ZERO,
            run_on_startup: false,
            conditions: ConditionsBuilder::default(),
        }
    }
}

/// Final builder stage: optional conditions.
pub struct EntityListenerOptions {
    entity_ids: Vec<String>,
    callback: EntityCallback,
    from_state: String,
    to_state: String,
    delay: Duration,
    run_on_startup: bool,
    conditions: ConditionsBuilder,
}

impl EntityListenerOptions {
    /// Only fire between `start` and `end` (`HH:MM`, end exclusive).
    ///
    /// An `end` earlier than `start` spans midnight.
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

    /// Only fire when the previous state equals `state`.
    #[must_use]
    pub fn from_state(mut self, state: impl Into<String>) -> Self {
        self.from_state = state.into();
        self
    }

    /// Only fire when the new state equals `state`.
    ///
    /// A change to any other state also cancels a pending delayed call.
    #[must_use]
    pub fn to_state(mut self, state: impl Into<String>) -> Self {
        self.to_state = state.into();
        self
    }

    /// Wait `delay` before firing; a new matching change restarts the wait.
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
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

    /// Run the callback once with the current state when the engine starts.
    #[must_use]
    pub fn run_on_startup(mut self) -> Self {
        self.run_on_startup = true;
        self
    }

    /// Only fire while `entity_id` is in `state`.
    ///
    /// If the state cannot be fetched, the listener fires only if
    /// `run_on_network_error` is `true`.
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
    ///
    /// If the state cannot be fetched, the listener fires only if
    /// `run_on_network_error` is `true`.
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
    /// Returns `ListenerError` if:
    /// - No entity ID was given, or one is empty
    /// - A time of day is not in `HH:MM` form
    /// - An exception range ends before it starts
    /// - An `enabled_when` / `disabled_when` entity ID is empty
    pub fn build(self) -> Result<EntityListener, ListenerError> {
        validate_keys(&self.entity_ids)?;
        let conditions = self.conditions.finish()?;

        Ok(EntityListener {
            id: ListenerId::new(),
            entity_ids: self.entity_ids,
            callback: self.callback,
            from_state: self.from_state,
            to_state: self.to_state,
            delay: self.delay,
            run_on_startup: self.run_on_startup,
            conditions,
            last_ran: Mutex::new(None),
            delay_timer: DelayTimer::new(),
            startup_completed: AtomicBool::new(false),
        })
    }
}

impl std::fmt::Debug for EntityListenerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityListenerOptions")
            .field("entity_ids", &self.entity_ids)
            .field("from_state", &self.from_state)
            .field("to_state", &self.to_state)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::notification::StateChanged;
    use crate::types::TimeOfDay;

    fn noop(_: EntityData) {}

    #[test]
    fn builder_defaults() {
        let listener = EntityListener::builder()
            .entity_ids(["light.pantry"])
            .call(noop)
            .build()
            .unwrap();

        assert_eq!(listener.entity_ids(), ["light.pantry"]);
        assert_eq!(listener.from_state(), "");
        assert_eq!(listener.to_state(), "");
        assert_eq!(listener.delay(), Duration::ZERO);
        assert!(!listener.runs_on_startup());
        assert!(listener.last_ran().is_none());
        assert!(!listener.has_pending_delay());
        assert_eq!(listener.conditions(), &Conditions::default());
    }

    #[test]
    fn builder_all_options() {
        let listener = EntityListener::builder()
            .entity_ids(vec!["binary_sensor.a".to_string(), "binary_sensor.b".to_string()])
            .call(noop)
            .only_between("23:00", "07:00")
            .from_state("off")
            .to_state("on")
            .delay(Duration::from_secs(5))
            .throttle(Duration::from_secs(30))
            .exception_dates([NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()])
            .exception_range(Utc::now(), Utc::now() + chrono::TimeDelta::days(1))
            .run_on_startup()
            .enabled_when("input_boolean.away", "on", false)
            .disabled_when("input_boolean.guest", "on", true)
            .build()
            .unwrap();

        assert_eq!(listener.entity_ids().len(), 2);
        assert_eq!(listener.from_state(), "off");
        assert_eq!(listener.to_state(), "on");
        assert_eq!(listener.delay(), Duration::from_secs(5));
        assert!(listener.runs_on_startup());

        let conditions = listener.conditions();
        assert_eq!(conditions.between_start, TimeOfDay::from_hm(23, 0));
        assert_eq!(conditions.between_end, TimeOfDay::from_hm(7, 0));
        assert_eq!(conditions.throttle, Duration::from_secs(30));
        assert_eq!(conditions.exception_dates.len(), 1);
        assert_eq!(conditions.exception_ranges.len(), 1);
        assert_eq!(conditions.enabled_entities[0].entity_id, "input_boolean.away");
        assert_eq!(conditions.disabled_entities[0].entity_id, "input_boolean.guest");
    }

    #[test]
    fn build_rejects_no_entity_ids() {
        let result = EntityListener::builder()
            .entity_ids(Vec::<String>::new())
            .call(noop)
            .build();
        assert_eq!(result.unwrap_err(), ListenerError::NoMatchKeys);
    }

    #[test]
    fn build_rejects_empty_entity_id() {
        let result = EntityListener::builder()
            .entity_ids(["light.pantry", ""])
            .call(noop)
            .build();
        assert_eq!(
            result.unwrap_err(),
            ListenerError::EmptyMatchKey { index: 1 }
        );
    }

    #[test]
    fn repeated_entity_ids_are_collapsed() {
        let listener = EntityListener::builder()
            .entity_ids(["light.pantry", "light.hall", "light.pantry"])
            .call(noop)
            .build()
            .unwrap();
        assert_eq!(listener.entity_ids(), ["light.pantry", "light.hall"]);
    }

    #[test]
    fn build_rejects_bad_time() {
        let result = EntityListener::builder()
            .entity_ids(["light.pantry"])
            .call(noop)
            .only_after("7pm")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ListenerError::InvalidTime { .. }
        ));
    }

    #[test]
    fn build_rejects_empty_enabled_entity() {
        let result = EntityListener::builder()
            .entity_ids(["light.pantry"])
            .call(noop)
            .enabled_when("", "on", true)
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ListenerError::EmptyEntityId {
                clause: "enabled_when",
                ..
            }
        ));
    }

    #[test]
    fn startup_run_is_claimed_once() {
        let once = EntityListener::builder()
            .entity_ids(["cover.garage"])
            .call(noop)
            .run_on_startup()
            .build()
            .unwrap();
        assert!(once.claim_startup_run());
        assert!(!once.claim_startup_run());

        let never = EntityListener::builder()
            .entity_ids(["cover.garage"])
            .call(noop)
            .build()
            .unwrap();
        assert!(!never.claim_startup_run());
    }

    #[tokio::test]
    async fn fire_records_last_ran() {
        let listener = EntityListener::builder()
            .entity_ids(["light.pantry"])
            .call(noop)
            .build()
            .unwrap();

        let before = Instant::now();
        listener.fire(EntityData::from_change(&StateChanged::new(
            "light.pantry",
            "off",
            "on",
        )));
        assert!(listener.last_ran().unwrap() >= before);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_schedule_writes_back_last_ran() {
        let listener = Arc::new(
            EntityListener::builder()
                .entity_ids(["light.pantry"])
                .call(noop)
                .delay(Duration::from_secs(5))
                .build()
                .unwrap(),
        );

        let data = EntityData::from_change(&StateChanged::new("light.pantry", "off", "on"));
        listener.schedule(data);
        assert!(listener.has_pending_delay());
        assert!(listener.last_ran().is_none());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!listener.has_pending_delay());
        assert!(listener.last_ran().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_delay_reports_pending() {
        let listener = Arc::new(
            EntityListener::builder()
                .entity_ids(["light.pantry"])
                .call(noop)
                .delay(Duration::from_secs(5))
                .build()
                .unwrap(),
        );

        assert!(!listener.cancel_delay());
        listener.schedule(EntityData::from_change(&StateChanged::new(
            "light.pantry",
            "off",
            "on",
        )));
        assert!(listener.cancel_delay());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(listener.last_ran().is_none());
    }
}
