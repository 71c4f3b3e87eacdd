// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Closed instant intervals used for exception ranges.

use chrono::{DateTime, TimeZone, Utc};

use crate::error::ListenerError;

/// A closed `[start, end]` interval between two instants.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use hass_rules::types::TimeRange;
///
/// let range = TimeRange::new(
///     Utc.with_ymd_and_hms(2024, 12, 24, 18, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2024, 12, 26, 9, 0, 0).unwrap(),
/// )
/// .unwrap();
///
/// assert!(range.contains(&Utc.with_ymd_and_hms(2024, 12, 25, 12, 0, 0).unwrap()));
/// assert!(range.contains(&Utc.with_ymd_and_hms(2024, 12, 26, 9, 0, 0).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Creates a range from two instants in any timezone.
    ///
    /// # Errors
    ///
    /// Returns `ListenerError::InvalidExceptionRange` if `end` is before `start`.
    pub fn new<Tz: TimeZone>(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self, ListenerError> {
        let start = start.with_timezone(&Utc);
        let end = end.with_timezone(&Utc);
        if end < start {
            return Err(ListenerError::InvalidExceptionRange);
        }
        Ok(Self { start, end })
    }

    /// Returns the start of the range.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the end of the range.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns `true` if `instant` lies within the range, bounds included.
    #[must_use]
    pub fn contains<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        let instant = instant.with_timezone(&Utc);
        self.start <= instant && instant <= self.end
    }
}
