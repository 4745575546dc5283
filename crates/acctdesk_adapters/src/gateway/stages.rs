//! Pipeline stages run by the gateway around each request.
//!
//! Request stages run in order before the transport and may rewrite the
//! request. Failure stages observe every failed call in order; they exist
//! for side effects and cannot change the error the caller receives.

use std::sync::Arc;

use acctdesk_core::ports::{AuthSession, Navigator};
use tracing::warn;

use super::request::{ApiRequest, GatewayFailure, TransportError};

pub trait RequestStage: Send + Sync {
    fn prepare(&self, request: ApiRequest) -> Result<ApiRequest, TransportError>;
}

pub trait FailureStage: Send + Sync {
    fn observe(&self, failure: &GatewayFailure);
}

/// Hook point for authentication headers; forwards requests unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl RequestStage for PassThrough {
    fn prepare(&self, request: ApiRequest) -> Result<ApiRequest, TransportError> {
        Ok(request)
    }
}

/// Logs the console out and sends it to the login route on HTTP 401
pub struct SessionExpiryStage {
    session: Arc<dyn AuthSession>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
}

impl SessionExpiryStage {
    pub fn new(
        session: Arc<dyn AuthSession>,
        navigator: Arc<dyn Navigator>,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            session,
            navigator,
            login_route: login_route.into(),
        }
    }
}

impl FailureStage for SessionExpiryStage {
    fn observe(&self, failure: &GatewayFailure) {
        if !failure.is_unauthorized() {
            return;
        }
        warn!(route = %self.login_route, "session expired, redirecting to login");
        self.session.set_logged_in(false);
        self.navigator.navigate(&self.login_route);
    }
}
