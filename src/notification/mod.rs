// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of incoming Home Assistant notifications.
//!
//! The websocket transport delivers raw JSON messages of the form:
//!
//! ```text
//! {"id": 3, "type": "event", "event": {"event_type": "...", "data": {...}}}
//! ```
//!
//! Only the fields needed for routing are extracted. A `state_changed`
//! event is additionally decoded into a [`StateChanged`] record; every other
//! event type is passed on as raw [`EventData`].
//!
//! # Examples
//!
//! ```
//! use hass_rules::notification::Notification;
//!
//! let raw = r#"{
//!     "type": "event",
//!     "event": {
//!         "event_type": "state_changed",
//!         "data": {
//!             "entity_id": "light.pantry",
//!             "old_state": {"state": "off", "attributes": {}},
//!             "new_state": {"state": "on", "attributes": {"brightness": 255}}
//!         }
//!     }
//! }"#;
//!
//! let notification = Notification::decode(raw).unwrap();
//! let change = notification.state_change().unwrap();
//! assert_eq!(change.entity_id, "light.pantry");
//! assert_eq!(change.new_state.state, "on");
//! ```

mod payload;
mod state;

pub use payload::{EntityData, EventData};
pub use state::{EntityState, StateChanged};

use serde::Deserialize;

use crate::error::ParseError;

/// Event type carrying entity state transitions.
pub const STATE_CHANGED: &str = "state_changed";

/// A decoded notification from the transport.
#[derive(Debug, Clone)]
pub enum Notification {
    /// An entity changed state.
    ///
    /// The generic event is kept alongside so that event listeners
    /// registered for `state_changed` still see it.
    StateChanged {
        /// The decoded state transition.
        change: StateChanged,
        /// The event as a whole.
        event: EventData,
    },

    /// Any other event.
    Event(EventData),
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    event: Option<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

impl Notification {
    /// Decodes a raw websocket message.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if:
    /// - The payload is not valid JSON
    /// - The message is not an `event` message
    /// - The event type is missing or empty
    /// - A `state_changed` event has no entity ID
    pub fn decode(raw: &str) -> Result<Self, ParseError> {
        let message: RawMessage = serde_json::from_str(raw)?;

        if let Some(kind) = message.kind.as_deref()
            && kind != "event"
        {
            return Err(ParseError::UnexpectedFormat(format!(
                "not an event message: {kind}"
            )));
        }

        let event = message
            .event
            .ok_or_else(|| ParseError::MissingField("event".to_string()))?;
        let event_type = event
            .event_type
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ParseError::MissingField("event.event_type".to_string()))?;

        let event_data = EventData::new(event_type, event.data, raw);

        if event_data.event_type == STATE_CHANGED {
            let change = StateChanged::from_event_data(&event_data.data)?;
            return Ok(Self::StateChanged {
                change,
                event: event_data,
            });
        }

        Ok(Self::Event(event_data))
    }

    /// Returns the event type of this notification.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event().event_type
    }

    /// Returns the generic event for this notification.
    #[must_use]
    pub fn event(&self) -> &EventData {
        match self {
            Self::StateChanged { event, .. } | Self::Event(event) => event,
        }
    }

    /// Returns the state transition if this is a `state_changed` notification.
    #[must_use]
    pub fn state_change(&self) -> Option<&StateChanged> {
        match self {
            Self::StateChanged { change, .. } => Some(change),
            Self::Event(_) => None,
        }
    }
}
