use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api: ApiSettings,
    pub store: StoreSettings,
    pub log_level: String,
    /// Base name of the daily log file (`<log_file>.log.<date>`)
    pub log_file: String,
    /// Write the log file as JSON lines instead of plain text
    pub log_json: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Prefix for every request path; empty means same-origin
    pub base_url: String,
    pub timeout_ms: u64,
    /// Keep and resend cookies (cookie-based admin session)
    pub with_credentials: bool,
    /// Route the navigator is sent to when the session expires
    pub login_route: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub refetch_on_failure: bool,
    pub expiry_window_hours: u32,
    /// UTC offset the server writes `expires_at` in (UTC+8)
    pub expiry_utc_offset_hours: i32,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Join the base URL and a request path without doubling the slash.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

impl StoreSettings {
    pub fn expiry_window(&self) -> Duration {
        Duration::from_secs(u64::from(self.expiry_window_hours) * 60 * 60)
    }

    pub fn expiry_offset(&self) -> Result<FixedOffset, Error> {
        self.expiry_utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "store.expiry_utc_offset_hours out of range: {}",
                    self.expiry_utc_offset_hours
                ))
            })
    }

    /// `now` as the server's wall clock, comparable with `expires_at`
    pub fn server_now(&self, now: DateTime<Utc>) -> Result<NaiveDateTime, Error> {
        Ok(now.with_timezone(&self.expiry_offset()?).naive_local())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            store: StoreSettings::default(),
            log_level: "info".to_string(),
            log_file: "acctdesk".to_string(),
            log_json: false,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: 30_000,
            with_credentials: true,
            login_route: "/login".to_string(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            refetch_on_failure: false,
            expiry_window_hours: 1,
            expiry_utc_offset_hours: 8,
        }
    }
}
