// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Time-of-day values for `only_between` style conditions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, TimeZone};

use crate::error::ListenerError;

/// A wall-clock time without a date, with minute precision.
///
/// Parsed from `HH:MM` strings such as `"07:30"` or `"23:00"`.
///
/// # Examples
///
/// ```
/// use hass_rules::types::TimeOfDay;
///
/// let t: TimeOfDay = "23:00".parse().unwrap();
/// assert_eq!(t.to_string(), "23:00");
///
/// assert!("25:00".parse::<TimeOfDay>().is_err());
/// assert!("noon".parse::<TimeOfDay>().is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Creates a time of day from hour and minute.
    ///
    /// Returns `None` if either component is out of range.
    #[must_use]
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Returns the underlying `NaiveTime`.
    #[must_use]
    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }

    /// Returns the instant at this time of day on the same calendar date as
    /// `now`, in `now`'s timezone.
    ///
    /// If the local time does not exist on that date (a DST gap), the naive
    /// time is interpreted as UTC instead.
    #[must_use]
    pub fn on_date_of<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let naive = now.date_naive().and_time(self.0);
        let tz = now.timezone();
        tz.from_local_datetime(&naive)
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive))
    }
}

impl FromStr for TimeOfDay {
    type Err = ListenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self)
            .map_err(|_| ListenerError::InvalidTime {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}
