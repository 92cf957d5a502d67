// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP fetcher for Falcon Player devices.

use std::time::Duration;

use reqwest::Client;

use crate::error::FetchError;
use crate::protocol::{OVERLAY_MODELS_PATH, OverlayFetcher, OverlayModel, parse_overlay_models};

// ============================================================================
// HttpConfig - Shared settings for every polled device
// ============================================================================

/// Configuration shared by all HTTP device requests.
///
/// # Examples
///
/// ```
/// use fpp_mqtt_bridge::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new()
///     .with_port(8080)
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url("fpp-1"), "http://fpp-1:8080");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    port: Option<u16>,
    use_https: bool,
    timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: None,
            use_https: false,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

impl HttpConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a port applied to devices that do not name one.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Uses HTTPS for devices given without a scheme.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured port override.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL for a device.
    ///
    /// A device given with an explicit `http://` or `https://` scheme is used
    /// as-is. Otherwise the configured scheme and port are applied.
    #[must_use]
    pub fn base_url(&self, device: &str) -> String {
        let device = device.trim().trim_end_matches('/');
        if device.starts_with("http://") || device.starts_with("https://") {
            return device.to_string();
        }

        let scheme = if self.use_https { "https" } else { "http" };
        match self.port {
            Some(port) if !device.contains(':') => format!("{scheme}://{device}:{port}"),
            _ => format!("{scheme}://{device}"),
        }
    }

    /// Creates an `HttpFetcher` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_fetcher(self) -> Result<HttpFetcher, FetchError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(FetchError::Http)?;

        Ok(HttpFetcher {
            client,
            config: self,
        })
    }
}

// ============================================================================
// HttpFetcher - Reads overlay model listings over HTTP
// ============================================================================

/// Fetches overlay model listings from devices over HTTP.
///
/// One fetcher serves every device; the underlying connection pool is
/// shared.
///
/// # Examples
///
/// ```no_run
/// use fpp_mqtt_bridge::protocol::{HttpFetcher, OverlayFetcher};
///
/// # async fn example() -> Result<(), fpp_mqtt_bridge::error::FetchError> {
/// let fetcher = HttpFetcher::new()?;
/// for model in fetcher.fetch_models("fpp-garage.local").await? {
///     println!("{}: {}", model.name, model.is_on());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: HttpConfig,
}

impl HttpFetcher {
    /// Creates a fetcher with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, FetchError> {
        HttpConfig::default().into_fetcher()
    }

    /// Returns the configuration in use.
    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Builds the overlay model listing URL for a device.
    #[must_use]
    pub fn models_url(&self, device: &str) -> String {
        format!("{}{OVERLAY_MODELS_PATH}", self.config.base_url(device))
    }
}

impl OverlayFetcher for HttpFetcher {
    async fn fetch_models(&self, device: &str) -> Result<Vec<OverlayModel>, FetchError> {
        let url = self.models_url(device);

        tracing::debug!(url = %url, "Querying overlay model states");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(FetchError::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await.map_err(FetchError::Http)?;

        tracing::debug!(device = %device, bytes = body.len(), "Fetched models; parsing response");

        Ok(parse_overlay_models(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = HttpConfig::new();
        assert_eq!(config.port(), None);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn base_url_plain_host() {
        let config = HttpConfig::new();
        assert_eq!(config.base_url("fpp-1"), "http://fpp-1");
        assert_eq!(config.base_url("fpp-1.local"), "http://fpp-1.local");
    }

    #[test]
    fn base_url_with_port() {
        let config = HttpConfig::new().with_port(8080);
        assert_eq!(config.base_url("fpp-1"), "http://fpp-1:8080");
        // A port on the device wins
        assert_eq!(config.base_url("fpp-1:9000"), "http://fpp-1:9000");
    }

    #[test]
    fn base_url_with_https() {
        let config = HttpConfig::new().with_https();
        assert_eq!(config.base_url("fpp-1"), "https://fpp-1");
    }

    #[test]
    fn base_url_keeps_explicit_scheme() {
        let config = HttpConfig::new().with_port(8080);
        assert_eq!(
            config.base_url("https://fpp-1.local/"),
            "https://fpp-1.local"
        );
    }

    #[test]
    fn models_url() {
        let fetcher = HttpConfig::new().into_fetcher().unwrap();
        assert_eq!(
            fetcher.models_url("192.168.1.20"),
            "http://192.168.1.20/api/overlays/models"
        );
    }

    #[test]
    fn fetcher_keeps_config() {
        let fetcher = HttpConfig::new()
            .with_timeout(Duration::from_secs(3))
            .into_fetcher()
            .unwrap();
        assert_eq!(fetcher.config().timeout(), Duration::from_secs(3));
    }
}
