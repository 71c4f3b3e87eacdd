// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `hass_rules` library.
//!
//! Registration mistakes surface as [`ListenerError`] when a listener is
//! built. State lookups fail with [`OracleError`], and incoming messages that
//! cannot be decoded produce a [`ParseError`]. Only the first kind is meant to
//! reach application code; the engine resolves the other two internally.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A listener definition is incomplete or invalid.
    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),

    /// Querying the current state of an entity failed.
    #[error("state oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// An incoming message could not be decoded.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Errors raised while building a listener.
///
/// These are programming errors in the registration code and should abort
/// startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// The listener has no entity IDs or event types to match on.
    #[error("listener must match at least one key")]
    NoMatchKeys,

    /// One of the entity IDs or event types is an empty string.
    #[error("listener key at position {index} is empty")]
    EmptyMatchKey {
        /// Position of the empty key in the list given to the builder.
        index: usize,
    },

    /// An enable/disable clause was given an empty entity ID.
    #[error("entity ID is empty in {clause} clause (state='{state}')")]
    EmptyEntityId {
        /// Which clause was affected (`enabled_when` or `disabled_when`).
        clause: &'static str,
        /// The state the clause was configured with.
        state: String,
    },

    /// A time-of-day string is not in `HH:MM` form.
    #[error("invalid time of day '{value}' (expected HH:MM)")]
    InvalidTime {
        /// The rejected input.
        value: String,
    },

    /// An exception range ends before it starts.
    #[error("exception range ends before it starts")]
    InvalidExceptionRange,
}

/// Errors returned by a [`StateOracle`](crate::oracle::StateOracle).
#[derive(Debug, Error)]
pub enum OracleError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The query did not complete in time.
    #[error("state query timed out after {0} ms")]
    Timeout(u64),

    /// The entity does not exist.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// The access token was rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The server answered with an unexpected status.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The response body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to decoding incoming notifications.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the message.
    #[error("missing field in message: {0}")]
    MissingField(String),

    /// Unexpected message format.
    #[error("unexpected message format: {0}")]
    UnexpectedFormat(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
