// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Returns `true` unless `filter` is set and differs from `observed`.
///
/// An empty filter matches any state.
///
/// # Examples
///
/// ```
/// use hass_rules::condition::states_match;
///
/// assert!(states_match("", "anything"));
/// assert!(states_match("on", "on"));
/// assert!(!states_match("on", "off"));
/// ```
#[must_use]
pub fn states_match(filter: &str, observed: &str) -> bool {
    filter.is_empty() || filter == observed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_is_exact() {
        assert!(!states_match("on", "ON"));
        assert!(!states_match("on", ""));
        assert!(!states_match("on", "on "));
    }
}
