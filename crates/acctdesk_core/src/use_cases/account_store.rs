use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use futures_util::future::join_all;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::entities::{
    accounts_from_payload, AccountConfigItem, AccountCounts, AccountId, AccountRecord, StoreState,
};
use crate::error::Error;
use crate::ports::AccountsApi;

/// What to do with local state when an optimistic mutation fails remotely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Leave the optimistic change in place
    #[default]
    Keep,
    /// Reload the list from the server before reporting the failure
    Refetch,
}

impl FailurePolicy {
    pub fn from_refetch_flag(refetch_on_failure: bool) -> Self {
        if refetch_on_failure {
            FailurePolicy::Refetch
        } else {
            FailurePolicy::Keep
        }
    }
}

/// In-memory view of the managed accounts, kept in sync with the admin API.
///
/// Mutations are applied locally before the remote call is issued
/// (optimistic), except for [`update_config`](Self::update_config) which
/// waits for the server and then reloads. Remote errors are returned
/// unchanged.
pub struct AccountStore<A>
where
    A: AccountsApi,
{
    api: Arc<A>,
    state: watch::Sender<StoreState>,
    load_generation: AtomicU64,
    failure_policy: FailurePolicy,
}

impl<A> AccountStore<A>
where
    A: AccountsApi,
{
    pub fn new(api: Arc<A>) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            api,
            state,
            load_generation: AtomicU64::new(0),
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn accounts(&self) -> Vec<AccountRecord> {
        self.state.borrow().accounts.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn counts(&self) -> AccountCounts {
        self.state.borrow().counts()
    }

    /// Receiver notified after every local change
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// Enabled, refreshable accounts that expire within `window` of `now`.
    ///
    /// `now` must be on the server's clock (see `StoreSettings::server_now`).
    pub fn expiring_accounts(&self, now: NaiveDateTime, window: Duration) -> Vec<AccountId> {
        self.state
            .borrow()
            .accounts
            .iter()
            .filter(|a| !a.disabled && a.can_refresh() && a.expires_within(now, window))
            .map(|a| a.id.clone())
            .collect()
    }

    /// Replace the local list with the server's.
    ///
    /// Only the most recently started load is applied; responses of
    /// earlier, overlapping loads are dropped.
    #[instrument(skip(self))]
    pub async fn load_accounts(&self) -> Result<(), Error> {
        let generation = self.load_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| s.is_loading = true);
        let _loading = LoadingGuard {
            state: &self.state,
            latest: &self.load_generation,
            generation,
        };

        let accounts = self.api.list().await.and_then(accounts_from_payload)?;

        if self.load_generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding stale account list");
            return Ok(());
        }

        info!(count = accounts.len(), "loaded accounts");
        self.state.send_modify(move |s| s.accounts = accounts);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_account(&self, id: &AccountId) -> Result<(), Error> {
        self.state.send_modify(|s| s.accounts.retain(|a| &a.id != id));
        let result = self.api.delete(id).await.map(|_| ());
        self.settle(result).await
    }

    #[instrument(skip(self))]
    pub async fn disable_account(&self, id: &AccountId) -> Result<(), Error> {
        self.set_disabled(std::slice::from_ref(id), true);
        let result = self.api.disable(id).await.map(|_| ());
        self.settle(result).await
    }

    #[instrument(skip(self))]
    pub async fn enable_account(&self, id: &AccountId) -> Result<(), Error> {
        self.set_disabled(std::slice::from_ref(id), false);
        let result = self.api.enable(id).await.map(|_| ());
        self.settle(result).await
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn bulk_enable(&self, ids: &[AccountId]) -> Result<(), Error> {
        self.set_disabled(ids, false);
        let results = join_all(ids.iter().map(|id| self.api.enable(id))).await;
        self.settle(first_failure(ids, results)).await
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn bulk_disable(&self, ids: &[AccountId]) -> Result<(), Error> {
        self.set_disabled(ids, true);
        let results = join_all(ids.iter().map(|id| self.api.disable(id))).await;
        self.settle(first_failure(ids, results)).await
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn bulk_delete(&self, ids: &[AccountId]) -> Result<(), Error> {
        self.state
            .send_modify(|s| s.accounts.retain(|a| !ids.contains(&a.id)));
        let results = join_all(ids.iter().map(|id| self.api.delete(id))).await;
        self.settle(first_failure(ids, results)).await
    }

    /// Send a new account configuration, then reload the list from the server
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn update_config(&self, items: &[AccountConfigItem]) -> Result<(), Error> {
        self.api.update_config(items).await?;
        self.load_accounts().await
    }

    // =========================================================================
    // Private helpers
    // =========================================================================

    fn set_disabled(&self, ids: &[AccountId], disabled: bool) {
        self.state.send_modify(|s| {
            for id in ids {
                if let Some(account) = s.find_mut(id) {
                    account.disabled = disabled;
                }
            }
        });
    }

    async fn settle(&self, result: Result<(), Error>) -> Result<(), Error> {
        if let Err(e) = &result {
            if self.failure_policy == FailurePolicy::Refetch {
                warn!(error = %e, "remote mutation failed, reloading accounts");
                if let Err(reload) = self.load_accounts().await {
                    warn!(error = %reload, "reload after failed mutation failed");
                }
            }
        }
        result
    }
}

/// Clears `is_loading` when the load it belongs to is still the latest,
/// including when the load future is dropped mid-flight.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<StoreState>,
    latest: &'a AtomicU64,
    generation: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.latest.load(Ordering::SeqCst) == self.generation {
            self.state.send_modify(|s| s.is_loading = false);
        }
    }
}

/// First error in id order; the rest are only logged
fn first_failure(ids: &[AccountId], results: Vec<Result<Value, Error>>) -> Result<(), Error> {
    let mut first = None;
    for (id, result) in ids.iter().zip(results) {
        if let Err(e) = result {
            warn!(id = %id, error = %e, "bulk call failed");
            if first.is_none() {
                first = Some(e);
            }
        }
    }
    first.map_or(Ok(()), Err)
}
