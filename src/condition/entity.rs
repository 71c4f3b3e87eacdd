// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gates that depend on the live state of other entities.

use std::time::Duration;

use crate::oracle::{StateOracle, fetch_state};

/// One `enabled_when` / `disabled_when` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityCondition {
    /// The entity whose state is checked.
    pub entity_id: String,
    /// The state that enables (or disables) the listener.
    pub state: String,
    /// Whether the listener may run when the state cannot be fetched.
    pub run_on_network_error: bool,
}

impl EntityCondition {
    /// Creates a new clause.
    #[must_use]
    pub fn new(
        entity_id: impl Into<String>,
        state: impl Into<String>,
        run_on_network_error: bool,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            run_on_network_error,
        }
    }
}

/// Returns `true` if every clause's entity is currently in its required state.
///
/// A clause whose state cannot be fetched within `timeout` passes only if
/// its `run_on_network_error` flag is set. Clauses are checked in order and
/// checking stops at the first failure.
pub async fn entities_enabled<O: StateOracle>(
    oracle: &O,
    conditions: &[EntityCondition],
    timeout: Duration,
) -> bool {
    for condition in conditions {
        let pass = match fetch_state(oracle, &condition.entity_id, timeout).await {
            Ok(current) => current.state == condition.state,
            Err(e) => {
                tracing::warn!(
                    entity = %condition.entity_id,
                    error = %e,
                    run_on_network_error = condition.run_on_network_error,
                    "Failed to fetch state for enabled_when clause"
                );
                condition.run_on_network_error
            }
        };
        if !pass {
            return false;
        }
    }
    true
}

/// Returns `true` if no clause's entity is currently in its disabling state.
///
/// A clause whose state cannot be fetched within `timeout` passes only if
/// its `run_on_network_error` flag is set.
pub async fn entities_not_disabled<O: StateOracle>(
    oracle: &O,
    conditions: &[EntityCondition],
    timeout: Duration,
) -> bool {
    for condition in conditions {
        let pass = match fetch_state(oracle, &condition.entity_id, timeout).await {
            Ok(current) => current.state != condition.state,
            Err(e) => {
                tracing::warn!(
                    entity = %condition.entity_id,
                    error = %e,
                    run_on_network_error = condition.run_on_network_error,
                    "Failed to fetch state for disabled_when clause"
                );
                condition.run_on_network_error
            }
        };
        if !pass {
            return false;
        }
    }
    true
}
