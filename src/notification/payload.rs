// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Payloads handed to listener callbacks.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::state::{EntityState, StateChanged};
use crate::error::ParseError;

/// Data passed to entity listener callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityData {
    /// The entity whose change triggered the listener.
    pub trigger_entity_id: String,
    /// State value before the change.
    pub from_state: String,
    /// Attributes before the change.
    pub from_attributes: HashMap<String, serde_json::Value>,
    /// State value after the change.
    pub to_state: String,
    /// Attributes after the change.
    pub to_attributes: HashMap<String, serde_json::Value>,
    /// When the previous state was entered.
    pub last_changed: Option<DateTime<Utc>>,
}

impl EntityData {
    /// Builds the payload for a state transition.
    #[must_use]
    pub fn from_change(change: &StateChanged) -> Self {
        Self {
            trigger_entity_id: change.entity_id.clone(),
            from_state: change.old_state.state.clone(),
            from_attributes: change.old_state.attributes.clone(),
            to_state: change.new_state.state.clone(),
            to_attributes: change.new_state.attributes.clone(),
            last_changed: change.old_state.last_changed,
        }
    }

    /// Builds the payload used when a listener runs on startup.
    ///
    /// There is no transition, so both sides carry the current state.
    #[must_use]
    pub fn from_current(entity_id: &str, state: &EntityState) -> Self {
        Self {
            trigger_entity_id: entity_id.to_string(),
            from_state: state.state.clone(),
            from_attributes: state.attributes.clone(),
            to_state: state.state.clone(),
            to_attributes: state.attributes.clone(),
            last_changed: state.last_changed,
        }
    }
}

/// Data passed to event listener callbacks.
///
/// The structure of `data` depends on the event type, so the raw message is
/// kept and can be deserialized into a user type with [`parse`](Self::parse).
///
/// # Examples
///
/// ```
/// use hass_rules::notification::Notification;
///
/// #[derive(serde::Deserialize)]
/// struct ZwaveMessage {
///     event: ZwaveEvent,
/// }
///
/// #[derive(serde::Deserialize)]
/// struct ZwaveEvent {
///     data: ZwaveData,
/// }
///
/// #[derive(serde::Deserialize)]
/// struct ZwaveData {
///     node_id: u32,
/// }
///
/// let raw = r#"{"type":"event","event":{"event_type":"zwave_js_value_notification","data":{"node_id":7}}}"#;
/// let notification = Notification::decode(raw).unwrap();
///
/// let msg: ZwaveMessage = notification.event().parse().unwrap();
/// assert_eq!(msg.event.data.node_id, 7);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EventData {
    /// The event type (e.g., `zwave_js_value_notification`).
    pub event_type: String,
    /// The `event.data` object.
    pub data: serde_json::Value,
    raw_event_json: Arc<str>,
}

impl EventData {
    /// Creates event data from its parts.
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: serde_json::Value, raw: &str) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            raw_event_json: Arc::from(raw),
        }
    }

    /// Returns the raw JSON message this event was decoded from.
    #[must_use]
    pub fn raw_event_json(&self) -> &str {
        &self.raw_event_json
    }

    /// Parses the raw message as a specific type.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON cannot be parsed into the target type.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, ParseError> {
        serde_json::from_str(&self.raw_event_json).map_err(Into::into)
    }
}
