// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types used by listener conditions.
//!
//! # Types
//!
//! - [`TimeOfDay`] - A wall-clock time parsed from `HH:MM`
//! - [`TimeRange`] - A closed interval between two instants

mod time_of_day;
mod time_range;

pub use time_of_day::TimeOfDay;
pub use time_range::TimeRange;
