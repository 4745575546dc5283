use std::path::Path;
use std::sync::Arc;

use acctdesk_core::{
    entities::{AccountConfigItem, AccountId},
    error::Error,
    ports::AccountsApi,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::gateway::HttpGateway;

const ACCOUNTS_PATH: &str = "/admin/accounts";
const ACCOUNTS_CONFIG_PATH: &str = "/admin/accounts-config";

/// Admin account endpoints, spoken through the shared gateway
pub struct HttpAccountsApi {
    gateway: Arc<HttpGateway>,
}

impl HttpAccountsApi {
    pub fn new(gateway: Arc<HttpGateway>) -> Self {
        Self { gateway }
    }

    fn account_path(id: &AccountId) -> String {
        format!("{}/{}", ACCOUNTS_PATH, urlencoding::encode(id.as_str()))
    }
}

#[async_trait]
impl AccountsApi for HttpAccountsApi {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Value, Error> {
        self.gateway.get(ACCOUNTS_PATH).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &AccountId) -> Result<Value, Error> {
        self.gateway.delete(&Self::account_path(id)).await
    }

    #[instrument(skip(self))]
    async fn disable(&self, id: &AccountId) -> Result<Value, Error> {
        let path = format!("{}/disable", Self::account_path(id));
        self.gateway.put(&path, None).await
    }

    #[instrument(skip(self))]
    async fn enable(&self, id: &AccountId) -> Result<Value, Error> {
        let path = format!("{}/enable", Self::account_path(id));
        self.gateway.put(&path, None).await
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn update_config(&self, items: &[AccountConfigItem]) -> Result<Value, Error> {
        let body = serde_json::to_value(items)
            .map_err(|e| Error::Other(format!("failed to encode account config: {}", e)))?;
        self.gateway.put(ACCOUNTS_CONFIG_PATH, Some(body)).await
    }
}

/// Read an account configuration file (a JSON array of config items)
pub fn read_config_items(path: &Path) -> Result<Vec<AccountConfigItem>, Error> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Configuration(format!(
            "'{}' is not a valid account config: {}",
            path.display(),
            e
        ))
    })
}
