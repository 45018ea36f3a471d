//! Client configuration.

use std::time::Duration;

use coachbox_core::ApiUrl;
use coachbox_core::claims::DEFAULT_EXPIRY_MARGIN;

/// Default transport timeout for every request, including refresh.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a [`SessionManager`](crate::SessionManager).
///
/// Required fields are constructor parameters; everything else has a default
/// and can be overridden by chaining.
///
/// ```
/// use std::time::Duration;
///
/// use coachbox_core::ApiUrl;
/// use coachbox_http::ClientConfig;
///
/// let config = ClientConfig::new(ApiUrl::new("https://api.example.com").unwrap())
///     .with_timeout(Duration::from_secs(10))
///     .with_expiry_margin(chrono::Duration::seconds(60));
/// assert_eq!(config.timeout(), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    api: ApiUrl,
    timeout: Duration,
    expiry_margin: chrono::Duration,
    user_agent: String,
}

impl ClientConfig {
    /// Create a configuration for the backend at `api`.
    pub fn new(api: ApiUrl) -> Self {
        Self {
            api,
            timeout: DEFAULT_TIMEOUT,
            expiry_margin: DEFAULT_EXPIRY_MARGIN,
            user_agent: concat!("coachbox/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Override the transport timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override how long before `exp` a token stops being used.
    #[must_use]
    pub fn with_expiry_margin(mut self, margin: chrono::Duration) -> Self {
        self.expiry_margin = margin;
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Backend base URL.
    pub fn api(&self) -> &ApiUrl {
        &self.api
    }

    /// Transport timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Expiry safety margin.
    pub fn expiry_margin(&self) -> chrono::Duration {
        self.expiry_margin
    }

    /// `User-Agent` header value.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
