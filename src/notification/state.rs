// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity state records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// The state of an entity at a point in time.
///
/// This is the shape Home Assistant uses both in `state_changed` events and
/// in REST state queries. Fields missing from the payload take their default
/// values.
///
/// # Examples
///
/// ```
/// use hass_rules::notification::EntityState;
///
/// let json = r#"{"entity_id":"input_boolean.away","state":"on","attributes":{"friendly_name":"Away"}}"#;
/// let state: EntityState = serde_json::from_str(json).unwrap();
///
/// assert_eq!(state.state, "on");
/// assert_eq!(state.attributes["friendly_name"], "Away");
/// assert!(state.last_changed.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// The entity this state belongs to.
    #[serde(default)]
    pub entity_id: String,

    /// The state value (e.g., "on", "off", "23.5", "unavailable").
    #[serde(default)]
    pub state: String,

    /// Additional attributes associated with the state.
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,

    /// When the state value last changed.
    #[serde(default)]
    pub last_changed: Option<DateTime<Utc>>,
}

impl EntityState {
    /// Creates a state with the given value and no attributes.
    #[must_use]
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            ..Self::default()
        }
    }
}

/// A decoded `state_changed` event.
///
/// Home Assistant sends `null` for `old_state` when an entity is first added
/// and for `new_state` when it is removed; both decode to an empty
/// [`EntityState`].
#[derive(Debug, Clone, PartialEq)]
pub struct StateChanged {
    /// The entity that changed.
    pub entity_id: String,
    /// The state before the change.
    pub old_state: EntityState,
    /// The state after the change.
    pub new_state: EntityState,
}

#[derive(Debug, Deserialize)]
struct RawStateChanged {
    #[serde(default)]
    entity_id: Option<String>,
    #[serde(default)]
    old_state: Option<EntityState>,
    #[serde(default)]
    new_state: Option<EntityState>,
}

impl StateChanged {
    /// Creates a state change between two state values.
    #[must_use]
    pub fn new(
        entity_id: impl Into<String>,
        old_state: impl Into<String>,
        new_state: impl Into<String>,
    ) -> Self {
        let entity_id = entity_id.into();
        Self {
            old_state: EntityState::new(entity_id.clone(), old_state),
            new_state: EntityState::new(entity_id.clone(), new_state),
            entity_id,
        }
    }

    /// Returns `true` if only attributes changed, not the state value.
    #[must_use]
    pub fn is_attribute_only(&self) -> bool {
        self.old_state.state == self.new_state.state
    }

    /// Decodes the `data` object of a `state_changed` event.
    pub(crate) fn from_event_data(data: &serde_json::Value) -> Result<Self, ParseError> {
        let raw = RawStateChanged::deserialize(data)?;
        let entity_id = raw
            .entity_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ParseError::MissingField("event.data.entity_id".to_string()))?;

        Ok(Self {
            entity_id,
            old_state: raw.old_state.unwrap_or_default(),
            new_state: raw.new_state.unwrap_or_default(),
        })
    }
}
