// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clock-based gates: time windows, throttling and exceptions.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone};
use tokio::time::Instant;

use crate::types::{TimeOfDay, TimeRange};

/// Checks whether `now` falls inside a time-of-day window.
///
/// - Both bounds set: passes when `start <= now < end`. A window whose end is
///   earlier than its start spans midnight: if today's end has already
///   passed the end moves to tomorrow, otherwise the start moves to
///   yesterday.
/// - Only `start`: passes once today's start time has been reached.
/// - Only `end`: passes until today's end time has passed.
/// - Neither: always passes.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use hass_rules::condition::within_time_range;
/// use hass_rules::types::TimeOfDay;
///
/// let start = TimeOfDay::from_hm(23, 0);
/// let end = TimeOfDay::from_hm(7, 0);
///
/// let at = |h, m| Utc.with_ymd_and_hms(2024, 1, 10, h, m, 0).unwrap();
/// assert!(within_time_range(start, end, &at(23, 30)));
/// assert!(within_time_range(start, end, &at(6, 59)));
/// assert!(!within_time_range(start, end, &at(7, 0)));
/// assert!(!within_time_range(start, end, &at(15, 0)));
/// ```
#[must_use]
pub fn within_time_range<Tz: TimeZone>(
    start: Option<TimeOfDay>,
    end: Option<TimeOfDay>,
    now: &DateTime<Tz>,
) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => {
            let mut start = start.on_date_of(now);
            let mut end = end.on_date_of(now);

            if end < start {
                if end < *now {
                    end += TimeDelta::days(1);
                } else {
                    start -= TimeDelta::days(1);
                }
            }

            start <= *now && *now < end
        }
        (Some(start), None) => start.on_date_of(now) <= *now,
        (None, Some(end)) => end.on_date_of(now) >= *now,
        (None, None) => true,
    }
}

/// Returns `true` if at least `throttle` has elapsed since `last_ran`.
///
/// A zero throttle disables the check, and a listener that never ran is
/// never throttled. Does not modify `last_ran`.
#[must_use]
pub fn throttle_elapsed(throttle: Duration, last_ran: Option<Instant>, now: Instant) -> bool {
    if throttle.is_zero() {
        return true;
    }
    match last_ran {
        Some(last) => now.saturating_duration_since(last) >= throttle,
        None => true,
    }
}

/// Returns `true` unless today's calendar date is one of `dates`.
#[must_use]
pub fn not_exception_date<Tz: TimeZone>(dates: &[NaiveDate], now: &DateTime<Tz>) -> bool {
    let today = now.date_naive();
    !dates.contains(&today)
}

/// Returns `true` unless `now` lies within any of `ranges`.
#[must_use]
pub fn not_in_exception_range<Tz: TimeZone>(ranges: &[TimeRange], now: &DateTime<Tz>) -> bool {
    !ranges.iter().any(|range| range.contains(now))
}
