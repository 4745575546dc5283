use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::Error;

/// Format the admin API uses for `expires_at`
pub const EXPIRES_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Unique identifier of a managed account (usually the mailbox address)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Account as listed by the admin API.
///
/// Only the fields the console acts on are typed; everything else the
/// server sends is kept in `extra` so it round-trips untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccountRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: AccountId::new(id),
            disabled: false,
            expires_at: None,
            extra: Map::new(),
        }
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_expires_at(mut self, expires_at: impl Into<String>) -> Self {
        self.expires_at = Some(expires_at.into());
        self
    }

    fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Whether the server has what it needs to refresh this account's login.
    ///
    /// Microsoft mailboxes need an OAuth client id and refresh token, every
    /// other provider needs the mailbox password. Without an explicit provider,
    /// OAuth fields imply Microsoft.
    pub fn can_refresh(&self) -> bool {
        let has = |key: &str| self.extra_str(key).is_some();
        let microsoft = match self.extra_str("mail_provider") {
            Some(provider) => provider.eq_ignore_ascii_case("microsoft"),
            None => has("mail_client_id") || has("mail_refresh_token"),
        };
        if microsoft {
            has("mail_client_id") && has("mail_refresh_token")
        } else {
            has("mail_password") || has("email_password")
        }
    }

    /// Parsed expiry, `None` when missing or malformed
    pub fn expiry(&self) -> Option<NaiveDateTime> {
        self.expires_at
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, EXPIRES_AT_FORMAT).ok())
    }

    /// True when the account expires within `window` of `now` (or already has)
    pub fn expires_within(&self, now: NaiveDateTime, window: Duration) -> bool {
        let Some(expiry) = self.expiry() else {
            return false;
        };
        match chrono::Duration::from_std(window) {
            Ok(window) => expiry - now <= window,
            Err(_) => true,
        }
    }
}

/// Write model for replacing the whole account configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountConfigItem {
    pub id: AccountId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_c_ses: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_c_oses: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csesidx: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_tenant: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccountConfigItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: AccountId::new(id),
            secure_c_ses: None,
            host_c_oses: None,
            csesidx: None,
            config_id: None,
            expires_at: None,
            disabled: None,
            mail_provider: None,
            mail_address: None,
            mail_password: None,
            mail_client_id: None,
            mail_refresh_token: None,
            mail_tenant: None,
            extra: Map::new(),
        }
    }
}

/// Store contents observed by the UI
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub accounts: Vec<AccountRecord>,
    /// Set only while a full-list load is in flight
    pub is_loading: bool,
}

impl StoreState {
    pub fn find_mut(&mut self, id: &AccountId) -> Option<&mut AccountRecord> {
        self.accounts.iter_mut().find(|a| &a.id == id)
    }

    pub fn counts(&self) -> AccountCounts {
        let disabled = self.accounts.iter().filter(|a| a.disabled).count();
        AccountCounts {
            total: self.accounts.len(),
            enabled: self.accounts.len() - disabled,
            disabled,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountCounts {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
}

/// Turn a list payload into account records.
///
/// The list endpoint answers either with a bare array or with an object
/// carrying an `accounts` array. Anything else counts as an empty list.
/// Duplicate ids keep their first occurrence.
pub fn accounts_from_payload(payload: Value) -> Result<Vec<AccountRecord>, Error> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("accounts") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let records: Vec<AccountRecord> = serde_json::from_value(Value::Array(items))
        .map_err(|e| Error::InvalidServerResponse(format!("malformed account list: {}", e)))?;

    let mut seen = HashSet::with_capacity(records.len());
    let mut unique = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.id.clone()) {
            unique.push(record);
        } else {
            warn!(id = %record.id, "dropping duplicate account from list");
        }
    }
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, EXPIRES_AT_FORMAT).unwrap()
    }

    #[test]
    fn test_bare_list_payload() {
        let payload = json!([{"id": "1", "disabled": false}, {"id": "2", "disabled": true}]);
        let accounts = accounts_from_payload(payload).unwrap();
        assert_eq!(
            accounts,
            vec![
                AccountRecord::new("1"),
                AccountRecord::new("2").with_disabled(true)
            ]
        );
    }

    #[test]
    fn test_wrapped_list_payload() {
        let payload = json!({"total": 1, "accounts": [{"id": "a@example.com"}]});
        let accounts = accounts_from_payload(payload).unwrap();
        assert_eq!(accounts, vec![AccountRecord::new("a@example.com")]);
    }

    #[test]
    fn test_other_payloads_are_empty() {
        assert!(accounts_from_payload(json!({"accounts": null})).unwrap().is_empty());
        assert!(accounts_from_payload(json!({"items": []})).unwrap().is_empty());
        assert!(accounts_from_payload(json!("ok")).unwrap().is_empty());
        assert!(accounts_from_payload(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_records_are_rejected() {
        let err = accounts_from_payload(json!([{"disabled": true}])).unwrap_err();
        assert!(matches!(err, Error::InvalidServerResponse(_)));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let payload = json!([
            {"id": "1", "disabled": false},
            {"id": "1", "disabled": true},
            {"id": "2"}
        ]);
        let accounts = accounts_from_payload(payload).unwrap();
        assert_eq!(
            accounts,
            vec![AccountRecord::new("1"), AccountRecord::new("2")]
        );
    }

    #[test]
    fn test_extra_fields_round_trip() {
        let raw = json!({
            "id": "1",
            "disabled": false,
            "expires_at": "2026-10-19 12:00:00",
            "status": "active",
            "conversation_count": 3
        });
        let record: AccountRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.extra.get("status"), Some(&json!("active")));
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_config_item_omits_unset_fields() {
        let mut item = AccountConfigItem::new("a@example.com");
        item.mail_provider = Some("duckmail".to_string());
        item.disabled = Some(false);

        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"id": "a@example.com", "disabled": false, "mail_provider": "duckmail"})
        );
    }

    #[rstest]
    #[case(json!({"id": "a", "mail_password": "pw"}), true)]
    #[case(json!({"id": "a", "email_password": "pw"}), true)]
    #[case(json!({"id": "a", "mail_provider": "duckmail", "mail_password": ""}), false)]
    #[case(json!({"id": "a"}), false)]
    #[case(json!({"id": "a", "mail_client_id": "c", "mail_refresh_token": "r"}), true)]
    #[case(json!({"id": "a", "mail_client_id": "c", "mail_password": "pw"}), false)]
    #[case(json!({"id": "a", "mail_provider": "Microsoft", "mail_password": "pw"}), false)]
    #[case(json!({"id": "a", "mail_provider": "microsoft", "mail_client_id": "c", "mail_refresh_token": "r"}), true)]
    #[case(json!({"id": "a", "mail_provider": "gptmail", "mail_password": "pw", "mail_client_id": "c"}), true)]
    fn test_can_refresh(#[case] raw: Value, #[case] expected: bool) {
        let record: AccountRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.can_refresh(), expected);
    }

    #[test]
    fn test_expires_within() {
        let now = at("2026-10-19 12:00:00");
        let hour = Duration::from_secs(3600);

        let soon = AccountRecord::new("1").with_expires_at("2026-10-19 12:30:00");
        let later = AccountRecord::new("2").with_expires_at("2026-10-19 15:00:00");
        let past = AccountRecord::new("3").with_expires_at("2026-10-18 00:00:00");
        let unknown = AccountRecord::new("4").with_expires_at("tomorrow");

        assert!(soon.expires_within(now, hour));
        assert!(!later.expires_within(now, hour));
        assert!(past.expires_within(now, hour));
        assert!(!unknown.expires_within(now, hour));
        assert!(!AccountRecord::new("5").expires_within(now, hour));
    }

    #[test]
    fn test_counts() {
        let state = StoreState {
            accounts: vec![
                AccountRecord::new("1"),
                AccountRecord::new("2").with_disabled(true),
                AccountRecord::new("3"),
            ],
            is_loading: false,
        };
        assert_eq!(
            state.counts(),
            AccountCounts {
                total: 3,
                enabled: 2,
                disabled: 1
            }
        );
    }
}
