// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conditions shared by entity and event listeners.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::condition::EntityCondition;
use crate::error::ListenerError;
use crate::types::{TimeOfDay, TimeRange};

/// The gating conditions common to every listener kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    /// Start of the allowed time-of-day window.
    pub between_start: Option<TimeOfDay>,
    /// End of the allowed time-of-day window.
    pub between_end: Option<TimeOfDay>,
    /// Minimum interval between two callback invocations.
    pub throttle: Duration,
    /// Calendar dates on which the listener never fires.
    pub exception_dates: Vec<NaiveDate>,
    /// Instant ranges during which the listener never fires.
    pub exception_ranges: Vec<TimeRange>,
    /// Clauses that must all hold for the listener to fire.
    pub enabled_entities: Vec<EntityCondition>,
    /// Clauses none of which may hold for the listener to fire.
    pub disabled_entities: Vec<EntityCondition>,
}

/// Accumulates conditions for a builder, remembering the first error.
///
/// Builder methods are infallible so they can be chained; the recorded
/// error is returned from `build()`.
#[derive(Debug, Default)]
pub(crate) struct ConditionsBuilder {
    conditions: Conditions,
    error: Option<ListenerError>,
}

impl ConditionsBuilder {
    fn record(&mut self, error: ListenerError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn parse_time(&mut self, value: &str) -> Option<TimeOfDay> {
        match value.parse() {
            Ok(time) => Some(time),
            Err(e) => {
                self.record(e);
                None
            }
        }
    }

    pub(crate) fn only_after(&mut self, start: &str) {
        self.conditions.between_start = self.parse_time(start);
    }

    pub(crate) fn only_before(&mut self, end: &str) {
        self.conditions.between_end = self.parse_time(end);
    }

    pub(crate) fn throttle(&mut self, throttle: Duration) {
        self.conditions.throttle = throttle;
    }

    pub(crate) fn exception_dates(&mut self, dates: impl IntoIterator<Item = NaiveDate>) {
        self.conditions.exception_dates.extend(dates);
    }

    pub(crate) fn exception_range<Tz: TimeZone>(&mut self, start: DateTime<Tz>, end: DateTime<Tz>) {
        match TimeRange::new(start, end) {
            Ok(range) => self.conditions.exception_ranges.push(range),
            Err(e) => self.record(e),
        }
    }

    pub(crate) fn enabled_when(&mut self, entity_id: String, state: String, run_on_error: bool) {
        if entity_id.is_empty() {
            self.record(ListenerError::EmptyEntityId {
                clause: "enabled_when",
                state,
            });
            return;
        }
        self.conditions
            .enabled_entities
            .push(EntityCondition::new(entity_id, state, run_on_error));
    }

    pub(crate) fn disabled_when(&mut self, entity_id: String, state: String, run_on_error: bool) {
        if entity_id.is_empty() {
            self.record(ListenerError::EmptyEntityId {
                clause: "disabled_when",
                state,
            });
            return;
        }
        self.conditions
            .disabled_entities
            .push(EntityCondition::new(entity_id, state, run_on_error));
    }

    pub(crate) fn finish(self) -> Result<Conditions, ListenerError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.conditions),
        }
    }
}
