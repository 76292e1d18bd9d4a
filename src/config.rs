//! Connection configuration.
//!
//! Provides a fluent API for describing which bus to connect to and how
//! long to wait on it.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use napcat_bus::BusConfig;
//!
//! # fn example() -> napcat_bus::Result<()> {
//! let config = BusConfig::builder()
//!     .endpoint("ws://127.0.0.1:3001")
//!     .token("secret")
//!     .request_timeout(Duration::from_secs(20))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:3001";

/// Default bound on the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Query parameter carrying the credential.
const TOKEN_QUERY_KEY: &str = "access_token";

// ============================================================================
// BusConfig
// ============================================================================

/// Validated settings for one bus connection.
#[derive(Debug, Clone)]
pub struct BusConfig {
    endpoint: Url,
    token: Option<String>,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl BusConfig {
    /// Creates a new configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> BusConfigBuilder {
        BusConfigBuilder::new()
    }

    /// Returns the endpoint without the credential.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns `true` if a credential is configured.
    #[inline]
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Returns the handshake timeout.
    #[inline]
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the per-request deadline.
    #[inline]
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the URL to dial, with the credential appended when present.
    #[must_use]
    pub fn connect_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if let Some(token) = &self.token {
            url.query_pairs_mut().append_pair(TOKEN_QUERY_KEY, token);
        }
        url
    }
}

// ============================================================================
// BusConfigBuilder
// ============================================================================

/// Builder for [`BusConfig`].
#[derive(Debug, Default, Clone)]
pub struct BusConfigBuilder {
    endpoint: Option<String>,
    token: Option<String>,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl BusConfigBuilder {
    /// Creates a builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the WebSocket endpoint (e.g., `ws://127.0.0.1:3001`).
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the credential. Blank values are treated as absent.
    #[inline]
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then_some(token);
        self
    }

    /// Sets the credential from an optional value.
    #[inline]
    #[must_use]
    pub fn token_opt(self, token: Option<String>) -> Self {
        match token {
            Some(token) => self.token(token),
            None => self,
        }
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the per-request deadline.
    #[inline]
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds the configuration with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the endpoint does not parse
    /// - [`Error::Config`] if the scheme is not `ws` or a timeout is zero
    pub fn build(self) -> Result<BusConfig> {
        let endpoint = self.validate_endpoint()?;
        let connect_timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        if connect_timeout.is_zero() || request_timeout.is_zero() {
            return Err(Error::config("timeouts must be greater than zero"));
        }

        Ok(BusConfig {
            endpoint,
            token: self.token,
            connect_timeout,
            request_timeout,
        })
    }

    fn validate_endpoint(&self) -> Result<Url> {
        let raw = self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let url = Url::parse(raw.trim())?;

        // The WebSocket client is built without TLS support.
        match url.scheme() {
            "ws" => Ok(url),
            "wss" => Err(Error::config(
                "wss:// endpoints are not supported, use ws:// (e.g. behind a TLS-terminating proxy)",
            )),
            other => Err(Error::config(format!(
                "endpoint must use ws://, got {other}://"
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BusConfig::builder().build().expect("valid config");

        assert_eq!(config.endpoint().as_str(), "ws://127.0.0.1:3001/");
        assert_eq!(config.connect_timeout(), DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.request_timeout().as_secs(), 15);
        assert!(!config.has_token());
    }

    #[test]
    fn test_token_appended_as_query() {
        let config = BusConfig::builder()
            .endpoint("ws://bus.local:3001/onebot")
            .token("s3cr&t")
            .build()
            .expect("valid config");

        let url = config.connect_url();
        assert_eq!(url.path(), "/onebot");
        assert_eq!(url.query(), Some("access_token=s3cr%26t"));
        // The stored endpoint never carries the credential.
        assert_eq!(config.endpoint().query(), None);
    }

    #[test]
    fn test_blank_token_is_absent() {
        let config = BusConfig::builder()
            .token_opt(Some("  ".into()))
            .build()
            .expect("valid config");

        assert!(!config.has_token());
        assert_eq!(config.connect_url().query(), None);
    }

    #[test]
    fn test_rejects_http_scheme() {
        let err = BusConfig::builder()
            .endpoint("http://127.0.0.1:3000")
            .build()
            .expect_err("should reject");
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_rejects_wss_scheme() {
        let err = BusConfig::builder()
            .endpoint("wss://bus.example.com/onebot")
            .build()
            .expect_err("should reject");
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("wss://"));
    }

    #[test]
    fn test_rejects_unparsable_endpoint() {
        let err = BusConfig::builder()
            .endpoint("not a url")
            .build()
            .expect_err("should reject");
        assert!(matches!(err, Error::Url(_)));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = BusConfig::builder()
            .request_timeout(Duration::ZERO)
            .build()
            .expect_err("should reject");
        assert!(matches!(err, Error::Config { .. }));
    }
}
