// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine configuration.

use std::time::Duration;

/// Tuning options for the [`Engine`](super::Engine).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hass_rules::engine::EngineConfig;
///
/// let config = EngineConfig::default().with_oracle_timeout(Duration::from_secs(2));
/// assert_eq!(config.oracle_timeout(), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    oracle_timeout: Duration,
}

impl EngineConfig {
    /// Default time allowed for a single state lookup.
    pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            oracle_timeout: Self::DEFAULT_ORACLE_TIMEOUT,
        }
    }

    /// Sets how long an `enabled_when` / `disabled_when` state lookup may
    /// take before it counts as a network error.
    #[must_use]
    pub const fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    /// Returns the state lookup timeout.
    #[must_use]
    pub const fn oracle_timeout(&self) -> Duration {
        self.oracle_timeout
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
