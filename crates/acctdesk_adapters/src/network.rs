//! Shared HTTP client configuration for the admin API.
//!
//! One client is built per gateway so the cookie jar (the admin session)
//! is shared by every request the console makes.

use std::time::Duration;

use acctdesk_core::config::ApiSettings;
use acctdesk_core::Error;
use reqwest::Client;

/// Default connect timeout (10 seconds)
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent sent with every admin API request
pub const CONSOLE_USER_AGENT: &str = concat!("acctdesk/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used by the gateway.
///
/// This client is configured with:
/// - Cookie store enabled when `with_credentials` is set (session cookie auth)
/// - The configured request timeout, plus a connect timeout
/// - Console user agent
pub fn build_api_client(settings: &ApiSettings) -> Result<Client, Error> {
    Client::builder()
        .cookie_store(settings.with_credentials)
        .user_agent(CONSOLE_USER_AGENT)
        .timeout(settings.timeout())
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(settings.timeout()))
        .build()
        .map_err(|e| Error::Network(format!("failed to create API HTTP client: {}", e)))
}
