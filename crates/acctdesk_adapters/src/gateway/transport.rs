use acctdesk_core::config::ApiSettings;
use acctdesk_core::Error;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use super::request::{ApiRequest, Method, RawResponse, TransportError};
use crate::network::build_api_client;

/// Executes a prepared request against the remote API
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport sharing one client (and cookie jar)
pub struct ReqwestTransport {
    client: Client,
    settings: ApiSettings,
}

impl ReqwestTransport {
    pub fn new(settings: &ApiSettings) -> Result<Self, Error> {
        let client = build_api_client(settings)?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: Client, settings: &ApiSettings) -> Self {
        Self {
            client,
            settings: settings.clone(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = ?request.method, path = %request.path))]
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let url = self.settings.url_for(&request.path);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?
            .to_vec();

        debug!(status, bytes = body.len(), "received response");

        Ok(RawResponse { status, body })
    }
}
