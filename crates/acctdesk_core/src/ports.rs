use async_trait::async_trait;
use serde_json::Value;

use crate::entities::{AccountConfigItem, AccountId};
use crate::error::Error;

// ============================================================================
// Remote API Ports
// ============================================================================

/// Account-management endpoints of the admin API.
///
/// Implementations return the already-unwrapped response body; failures are
/// normalized [`Error::Api`](crate::Error::Api) values.
#[async_trait]
pub trait AccountsApi: Send + Sync {
    /// Fetch the account list (bare array or `{"accounts": [...]}`)
    async fn list(&self) -> Result<Value, Error>;

    async fn delete(&self, id: &AccountId) -> Result<Value, Error>;

    async fn disable(&self, id: &AccountId) -> Result<Value, Error>;

    async fn enable(&self, id: &AccountId) -> Result<Value, Error>;

    /// Replace the whole account configuration
    async fn update_config(&self, items: &[AccountConfigItem]) -> Result<Value, Error>;
}

// ============================================================================
// Session Ports
// ============================================================================

/// Holder of the console's "logged in" flag
pub trait AuthSession: Send + Sync {
    fn is_logged_in(&self) -> bool;

    fn set_logged_in(&self, logged_in: bool);
}

/// Client-side navigation
pub trait Navigator: Send + Sync {
    /// Move to `route`. Never fails; observers pick the change up themselves.
    fn navigate(&self, route: &str);
}
