// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener definitions and their builders.
//!
//! A listener pairs one or more trigger keys with a set of conditions and a
//! callback:
//!
//! - [`EntityListener`] - fires on state changes of entity IDs
//! - [`EventListener`] - fires on events of the given types
//!
//! Listeners are constructed with staged builders: the trigger keys must be
//! given first, then the callback, and only then the optional conditions.
//!
//! ```
//! use std::time::Duration;
//! use hass_rules::listener::EntityListener;
//!
//! # fn main() -> Result<(), hass_rules::error::ListenerError> {
//! let listener = EntityListener::builder()
//!     .entity_ids(["binary_sensor.pantry_door"])
//!     .call(|data| println!("pantry door is now {}", data.to_state))
//!     .only_between("07:00", "23:00")
//!     .throttle(Duration::from_secs(30))
//!     .enabled_when("input_boolean.away", "off", true)
//!     .build()?;
//! # let _ = listener;
//! # Ok(())
//! # }
//! ```
//!
//! # Runtime state
//!
//! Apart from its configuration, which never changes after `build()`, each
//! listener tracks when its callback last ran and (for entity listeners) a
//! pending delay timer. Only the dispatch engine updates these.

mod conditions;
mod delay_timer;
mod entity;
mod event;
mod id;

pub use conditions::Conditions;
pub use delay_timer::DelayTimer;
pub use entity::{
    EntityCallback, EntityListener, EntityListenerBuilder, EntityListenerOptions,
    EntityListenerWithIds,
};
pub use event::{
    EventCallback, EventListener, EventListenerBuilder, EventListenerOptions,
    EventListenerWithTypes,
};
pub use id::ListenerId;

use std::sync::Arc;

use crate::error::ListenerError;

/// Runs a user callback on the blocking pool without waiting for it.
///
/// A panicking callback is reported through `tracing` and does not affect
/// the caller or other callbacks.
pub(crate) fn spawn_callback<T>(id: ListenerId, callback: Arc<dyn Fn(T) + Send + Sync>, payload: T)
where
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(move || callback(payload));
    tokio::spawn(async move {
        if let Err(e) = handle.await {
            if e.is_panic() {
                tracing::error!(listener = %id, "Listener callback panicked");
            } else {
                tracing::warn!(listener = %id, error = %e, "Listener callback was cancelled");
            }
        }
    });
}

/// Validates the trigger keys given to a builder.
fn validate_keys(keys: &[String]) -> Result<(), ListenerError> {
    if keys.is_empty() {
        return Err(ListenerError::NoMatchKeys);
    }
    if let Some(index) = keys.iter().position(String::is_empty) {
        return Err(ListenerError::EmptyMatchKey { index });
    }
    Ok(())
}

/// Collects trigger keys, keeping only the first occurrence of each.
///
/// A listener is registered once per key, so a repeated key would make it
/// fire twice for one notification.
fn unique_keys<I, S>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut unique: Vec<String> = Vec::new();
    for key in keys {
        let key = key.into();
        if !unique.contains(&key) {
            unique.push(key);
        }
    }
    unique
}
