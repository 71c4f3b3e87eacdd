// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Condition gates evaluated before a listener callback fires.
//!
//! Each gate is a predicate that returns `true` when the listener may
//! proceed. Gates take the current instant as an argument instead of reading
//! the clock, so they can be evaluated deterministically.
//!
//! # Gates
//!
//! | Gate | Function |
//! |------|----------|
//! | Time window | [`within_time_range`] |
//! | From/to state | [`states_match`] |
//! | Throttle | [`throttle_elapsed`] |
//! | Exception dates | [`not_exception_date`] |
//! | Exception ranges | [`not_in_exception_range`] |
//! | Enabled entities | [`entities_enabled`] |
//! | Disabled entities | [`entities_not_disabled`] |
//!
//! The engine evaluates them in a fixed order and stops at the first one
//! that fails; [`Gate`] names the failing gate in logs.

mod entity;
mod state;
mod time;

pub use entity::{EntityCondition, entities_enabled, entities_not_disabled};
pub use state::states_match;
pub use time::{not_exception_date, not_in_exception_range, throttle_elapsed, within_time_range};

use std::fmt;

/// Identifies one gate of the evaluation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// `only_between` / `only_after` / `only_before`.
    TimeWindow,
    /// Previous state filter.
    FromState,
    /// New state filter.
    ToState,
    /// Minimum interval between firings.
    Throttle,
    /// Suppressed calendar dates.
    ExceptionDate,
    /// Suppressed instant ranges.
    ExceptionRange,
    /// `enabled_when` clauses.
    EnabledEntity,
    /// `disabled_when` clauses.
    DisabledEntity,
}

impl Gate {
    /// Returns a short, stable name for logging.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TimeWindow => "time_window",
            Self::FromState => "from_state",
            Self::ToState => "to_state",
            Self::Throttle => "throttle",
            Self::ExceptionDate => "exception_date",
            Self::ExceptionRange => "exception_range",
            Self::EnabledEntity => "enabled_entity",
            Self::DisabledEntity => "disabled_entity",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_display() {
        assert_eq!(Gate::TimeWindow.to_string(), "time_window");
        assert_eq!(Gate::DisabledEntity.to_string(), "disabled_entity");
    }
}
