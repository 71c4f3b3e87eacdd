// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener identifier type.

use std::fmt;

use uuid::Uuid;

/// Unique identifier for a registered listener.
///
/// Used to correlate log lines for one listener across notifications.
///
/// # Examples
///
/// ```
/// use hass_rules::listener::ListenerId;
///
/// let id = ListenerId::new();
/// assert_ne!(id, ListenerId::new());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Creates a new unique listener identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 characters are enough to tell listeners apart in logs
        let short = &self.0.to_string()[..8];
        write!(f, "ListenerId({short}...)")
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.0.to_string()[..8];
        f.write_str(short)
    }
}
