// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Live state lookups for enable/disable conditions.
//!
//! Listeners can be gated on the current state of an unrelated entity
//! (e.g. "only while `input_boolean.away` is `on`"). The engine asks a
//! [`StateOracle`] for that state each time such a listener is evaluated.
//!
//! # Implementations
//!
//! - [`HttpStateOracle`]: queries the Home Assistant REST API (feature `http`)
//!
//! Custom implementations only need to provide [`StateOracle::get_state`].
//! The engine applies its own timeout around every call.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{HttpStateOracle, OracleConfig};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::OracleError;
use crate::notification::EntityState;

/// Source of the current state of an entity.
pub trait StateOracle: Send + Sync {
    /// Fetches the current state of `entity_id`.
    ///
    /// # Errors
    ///
    /// Returns `OracleError` if the state cannot be retrieved.
    fn get_state(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<EntityState, OracleError>> + Send;
}

impl<O: StateOracle> StateOracle for Arc<O> {
    fn get_state(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<EntityState, OracleError>> + Send {
        (**self).get_state(entity_id)
    }
}

/// Fetches a state, failing with `OracleError::Timeout` once `timeout` elapses.
pub(crate) async fn fetch_state<O: StateOracle>(
    oracle: &O,
    entity_id: &str,
    timeout: Duration,
) -> Result<EntityState, OracleError> {
    match tokio::time::timeout(timeout, oracle.get_state(entity_id)).await {
        Ok(result) => result,
        Err(_) => Err(OracleError::Timeout(
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowOracle;

    impl StateOracle for SlowOracle {
        async fn get_state(&self, entity_id: &str) -> Result<EntityState, OracleError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(EntityState::new(entity_id, "on"))
        }
    }

    struct FixedOracle(&'static str);

    impl StateOracle for FixedOracle {
        async fn get_state(&self, entity_id: &str) -> Result<EntityState, OracleError> {
            Ok(EntityState::new(entity_id, self.0))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_state_times_out() {
        let result = fetch_state(&SlowOracle, "sensor.slow", Duration::from_millis(250)).await;
        assert!(matches!(result, Err(OracleError::Timeout(250))));
    }

    #[tokio::test]
    async fn fetch_state_passes_through() {
        let state = fetch_state(&FixedOracle("off"), "switch.fan", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(state.entity_id, "switch.fan");
        assert_eq!(state.state, "off");
    }

    #[tokio::test]
    async fn arc_oracle_delegates() {
        let oracle = Arc::new(FixedOracle("home"));
        let state = oracle.get_state("person.sam").await.unwrap();
        assert_eq!(state.state, "home");
    }
}
