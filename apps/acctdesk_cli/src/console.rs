use std::sync::Arc;

use acctdesk_adapters::{HttpAccountsApi, HttpGateway, RouteHistory, SharedAuthSession};
use acctdesk_core::config::Settings;
use acctdesk_core::ports::AuthSession;
use acctdesk_core::use_cases::{AccountStore, FailurePolicy};
use acctdesk_core::Error;

/// Route the console starts on
pub const HOME_ROUTE: &str = "/accounts";

/// Everything one CLI invocation needs, wired once at startup
pub struct Console {
    pub settings: Settings,
    pub session: Arc<SharedAuthSession>,
    pub history: Arc<RouteHistory>,
    pub store: AccountStore<HttpAccountsApi>,
}

impl Console {
    pub fn new(settings: Settings) -> Result<Self, Error> {
        let session = Arc::new(SharedAuthSession::new(true));
        let history = Arc::new(RouteHistory::new(HOME_ROUTE));

        let gateway = HttpGateway::from_settings(&settings.api, session.clone(), history.clone())?;
        let api = Arc::new(HttpAccountsApi::new(Arc::new(gateway)));
        let store = AccountStore::new(api).with_failure_policy(FailurePolicy::from_refetch_flag(
            settings.store.refetch_on_failure,
        ));

        Ok(Self {
            settings,
            session,
            history,
            store,
        })
    }

    pub fn session_expired(&self) -> bool {
        !self.session.is_logged_in()
    }
}
