// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State oracle backed by the Home Assistant REST API.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use super::StateOracle;
use crate::error::OracleError;
use crate::notification::EntityState;

// ============================================================================
// OracleConfig - Connection settings for the REST API
// ============================================================================

/// Configuration for the Home Assistant REST API.
///
/// # Examples
///
/// ```
/// use hass_rules::oracle::OracleConfig;
/// use std::time::Duration;
///
/// // Simple configuration
/// let config = OracleConfig::new("192.168.1.10", "long-lived-token");
///
/// // With all options
/// let config = OracleConfig::new("ha.example.org", "long-lived-token")
///     .with_port(443)
///     .with_https()
///     .with_timeout(Duration::from_secs(3));
/// ```
#[derive(Clone)]
pub struct OracleConfig {
    host: String,
    port: u16,
    use_https: bool,
    token: String,
    timeout: Duration,
}

impl OracleConfig {
    /// Default Home Assistant port.
    pub const DEFAULT_PORT: u16 = 8123;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the given host and long-lived access token.
    #[must_use]
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            use_https: false,
            token: token.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables HTTPS.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns whether HTTPS is enabled.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix =
            if (self.use_https && self.port == 443) || (!self.use_https && self.port == 80) {
                String::new()
            } else {
                format!(":{}", self.port)
            };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Creates an `HttpStateOracle` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn into_oracle(self) -> Result<HttpStateOracle, OracleError> {
        if self.host.is_empty() {
            return Err(OracleError::InvalidAddress("host is required".to_string()));
        }
        let base_url = self.base_url();
        HttpStateOracle::with_timeout(base_url, self.token, self.timeout)
    }
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_https", &self.use_https)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// HttpStateOracle
// ============================================================================

/// Fetches entity states via `GET /api/states/<entity_id>`.
///
/// # Examples
///
/// ```no_run
/// use hass_rules::oracle::{HttpStateOracle, StateOracle};
///
/// # async fn example() -> Result<(), hass_rules::error::OracleError> {
/// let oracle = HttpStateOracle::new("http://homeassistant.local:8123", "token")?;
/// let state = oracle.get_state("input_boolean.away").await?;
/// println!("away mode is {}", state.state);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpStateOracle {
    base_url: String,
    client: Client,
    token: String,
}

impl HttpStateOracle {
    /// Creates an oracle for the given base URL with the default timeout.
    ///
    /// A missing scheme defaults to `http://`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, OracleError> {
        Self::with_timeout(base_url, token, OracleConfig::DEFAULT_TIMEOUT)
    }

    /// Creates an oracle with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn with_timeout(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let base_url = base_url.into();
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", base_url.trim_end_matches('/'))
        };

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OracleError::Http)?;

        Ok(Self {
            base_url,
            client,
            token: token.into(),
        })
    }

    /// Returns the base URL of the Home Assistant instance.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the URL for an entity state.
    fn state_url(&self, entity_id: &str) -> String {
        format!(
            "{}/api/states/{}",
            self.base_url,
            urlencoding::encode(entity_id)
        )
    }
}

impl StateOracle for HttpStateOracle {
    async fn get_state(&self, entity_id: &str) -> Result<EntityState, OracleError> {
        let url = self.state_url(entity_id);

        tracing::debug!(url = %url, "Fetching entity state");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(OracleError::Http)?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(OracleError::AuthenticationFailed),
            StatusCode::NOT_FOUND => return Err(OracleError::NotFound(entity_id.to_string())),
            status if !status.is_success() => {
                return Err(OracleError::RequestFailed(format!(
                    "HTTP {} - {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                )));
            }
            _ => {}
        }

        let body = response.text().await.map_err(OracleError::Http)?;

        tracing::trace!(body = %body, "Received entity state");

        serde_json::from_str(&body).map_err(|e| OracleError::InvalidResponse(e.to_string()))
    }
}

impl std::fmt::Debug for HttpStateOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStateOracle")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
