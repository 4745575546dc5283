//! HTTP gateway: the single entry point for admin API calls.
//!
//! Every call runs the same pipeline: request stages, transport, then either
//! the unwrapped success body or the failure stages followed by a normalized
//! [`ApiError`](acctdesk_core::ApiError).

mod request;
mod stages;
mod transport;

pub use request::{ApiRequest, GatewayFailure, Method, RawResponse, TransportError};
pub use stages::{FailureStage, PassThrough, RequestStage, SessionExpiryStage};
pub use transport::{ReqwestTransport, Transport};

use std::sync::Arc;

use acctdesk_core::config::ApiSettings;
use acctdesk_core::ports::{AuthSession, Navigator};
use acctdesk_core::Error;
use serde_json::Value;
use tracing::{debug, instrument, warn};

pub struct HttpGateway {
    transport: Arc<dyn Transport>,
    request_stages: Vec<Arc<dyn RequestStage>>,
    failure_stages: Vec<Arc<dyn FailureStage>>,
}

impl HttpGateway {
    pub fn builder(transport: Arc<dyn Transport>) -> GatewayBuilder {
        GatewayBuilder {
            transport,
            request_stages: Vec::new(),
            failure_stages: Vec::new(),
        }
    }

    /// Standard console pipeline: reqwest transport, pass-through request
    /// stage, and session expiry handling on 401.
    pub fn from_settings(
        settings: &ApiSettings,
        session: Arc<dyn AuthSession>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, Error> {
        let transport = ReqwestTransport::new(settings)?;
        Ok(Self::builder(Arc::new(transport))
            .request_stage(PassThrough)
            .failure_stage(SessionExpiryStage::new(
                session,
                navigator,
                settings.login_route.clone(),
            ))
            .build())
    }

    /// Run `request` through the pipeline and return the unwrapped body.
    #[instrument(skip(self, request), fields(method = ?request.method, path = %request.path))]
    pub async fn send(&self, request: ApiRequest) -> Result<Value, Error> {
        let failure = match self.dispatch(request).await {
            Ok(response) if response.is_success() => {
                debug!(status = response.status, "request succeeded");
                return Ok(response.into_payload());
            }
            Ok(response) => GatewayFailure::from_response(&response),
            Err(e) => GatewayFailure::from_transport(e),
        };

        for stage in &self.failure_stages {
            stage.observe(&failure);
        }

        let error = failure.normalize();
        warn!(status = ?error.status, message = %error.message, "request failed");
        Err(Error::Api(error))
    }

    pub async fn get(&self, path: &str) -> Result<Value, Error> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn put(&self, path: &str, body: Option<Value>) -> Result<Value, Error> {
        let request = ApiRequest::put(path);
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };
        self.send(request).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, Error> {
        self.send(ApiRequest::delete(path)).await
    }

    async fn dispatch(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let mut request = request;
        for stage in &self.request_stages {
            request = stage.prepare(request)?;
        }
        self.transport.execute(request).await
    }
}

pub struct GatewayBuilder {
    transport: Arc<dyn Transport>,
    request_stages: Vec<Arc<dyn RequestStage>>,
    failure_stages: Vec<Arc<dyn FailureStage>>,
}

impl GatewayBuilder {
    pub fn request_stage(mut self, stage: impl RequestStage + 'static) -> Self {
        self.request_stages.push(Arc::new(stage));
        self
    }

    pub fn failure_stage(mut self, stage: impl FailureStage + 'static) -> Self {
        self.failure_stages.push(Arc::new(stage));
        self
    }

    pub fn build(self) -> HttpGateway {
        HttpGateway {
            transport: self.transport,
            request_stages: self.request_stages,
            failure_stages: self.failure_stages,
        }
    }
}
