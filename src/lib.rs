// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `hass_rules` - Listener rules and event dispatch for Home Assistant clients.
//!
//! This library decides, for every notification received from Home
//! Assistant, which user callbacks should run, and runs them.
//!
//! # Supported Features
//!
//! - **Entity listeners**: react to state changes of one or more entities,
//!   optionally filtered on the previous and new state
//! - **Event listeners**: react to any event type
//! - **Conditions**: time-of-day windows, throttling, exception dates and
//!   ranges, enabling/disabling on the live state of other entities
//! - **Debounce**: delay a callback until a state has held for a while
//! - **Run on startup**: invoke a listener once with the current state
//!
//! The websocket connection is not part of this crate: feed the raw JSON
//! messages it receives into [`Engine::run`] through a channel.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use hass_rules::{Engine, EntityListener, EventListener, ListenerRegistry, OracleConfig};
//!
//! #[tokio::main]
//! async fn main() -> hass_rules::Result<()> {
//!     let mut registry = ListenerRegistry::new();
//!
//!     registry.register_entity_listener(
//!         EntityListener::builder()
//!             .entity_ids(["binary_sensor.front_door"])
//!             .call(|data| println!("front door: {} -> {}", data.from_state, data.to_state))
//!             .to_state("on")
//!             .only_between("22:00", "06:00")
//!             .throttle(Duration::from_secs(60))
//!             .build()?,
//!     );
//!
//!     registry.register_event_listener(
//!         EventListener::builder()
//!             .event_types(["zwave_js_value_notification"])
//!             .call(|event| println!("zwave: {}", event.data))
//!             .disabled_when("input_boolean.quiet_mode", "on", true)
//!             .build()?,
//!     );
//!
//!     let oracle = OracleConfig::new("homeassistant.local", "long-lived-token").into_oracle()?;
//!     let engine = Engine::new(registry, oracle);
//!
//!     let (tx, rx) = tokio::sync::mpsc::channel(256);
//!     // Hand `tx` to the websocket client.
//!     # drop(tx);
//!
//!     engine.run_startup_listeners().await;
//!     engine.run(rx).await;
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpStateOracle`], a state oracle backed by the
//!   Home Assistant REST API

pub mod condition;
pub mod engine;
pub mod error;
pub mod listener;
pub mod notification;
pub mod oracle;
pub mod registry;
pub mod types;

pub use engine::{Engine, EngineConfig};
pub use error::{Error, ListenerError, OracleError, ParseError, Result};
pub use listener::{EntityListener, EventListener, ListenerId};
pub use notification::{EntityData, EntityState, EventData, Notification, StateChanged};
#[cfg(feature = "http")]
pub use oracle::{HttpStateOracle, OracleConfig};
pub use oracle::StateOracle;
pub use registry::ListenerRegistry;
pub use types::{TimeOfDay, TimeRange};
