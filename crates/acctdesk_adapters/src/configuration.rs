use std::path::PathBuf;

use acctdesk_core::config::Settings;
use acctdesk_core::Error;
use config::{Config, Environment, File};
use directories::ProjectDirs;

/// Shortcut for the API base URL, applied after every other source
pub const API_URL_ENV: &str = "ACCTDESK_API_URL";

pub fn get_configuration_with_paths(
    current_dir_path: Option<PathBuf>,
    system_config_dir_path: Option<PathBuf>,
) -> Result<Settings, Error> {
    load_settings(current_dir_path, system_config_dir_path)
        .map_err(|e| Error::Configuration(e.to_string()))
}

pub fn get_configuration() -> Result<Settings, Error> {
    get_configuration_with_paths(None, None)
}

fn load_settings(
    current_dir_path: Option<PathBuf>,
    system_config_dir_path: Option<PathBuf>,
) -> Result<Settings, config::ConfigError> {
    let config_directory = current_dir_path.unwrap_or_else(|| {
        std::env::current_dir()
            .map(|p| p.join("config"))
            .unwrap_or_else(|_| PathBuf::from("config"))
    });

    let system_config_dir = if let Some(path) = system_config_dir_path {
        path
    } else {
        ProjectDirs::from("com", "acctdesk", "acctdesk")
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("config"))
    };

    let mut builder = Config::builder()
        // API settings
        .set_default("api.base_url", "")?
        .set_default("api.timeout_ms", 30_000)?
        .set_default("api.with_credentials", true)?
        .set_default("api.login_route", "/login")?
        // Store settings
        .set_default("store.refetch_on_failure", false)?
        .set_default("store.expiry_window_hours", 1)?
        .set_default("store.expiry_utc_offset_hours", 8)?
        // Logging
        .set_default("log_level", "info")?
        .set_default("log_file", "acctdesk")?
        .set_default("log_json", false)?
        .add_source(File::from(system_config_dir.join("config.toml")).required(false))
        .add_source(File::from(config_directory.join("config.toml")).required(false))
        .add_source(Environment::with_prefix("ACCTDESK").separator("__"));

    if let Ok(api_url) = std::env::var(API_URL_ENV) {
        builder = builder.set_override("api.base_url", api_url)?;
    }

    builder.build()?.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::tempdir;

    fn clear_env() {
        for (key, _) in std::env::vars() {
            if key.starts_with("ACCTDESK__") {
                std::env::remove_var(&key);
            }
        }
        std::env::remove_var(API_URL_ENV);
    }

    fn nowhere() -> Option<PathBuf> {
        Some(PathBuf::from("/nonexistent"))
    }

    #[serial]
    #[test]
    fn test_get_configuration_defaults() {
        clear_env();

        let settings = get_configuration_with_paths(nowhere(), nowhere()).unwrap();

        assert_eq!(settings, Settings::default());
    }

    #[serial]
    #[test]
    fn test_get_configuration_file_override() {
        clear_env();

        let dir = tempdir().unwrap();
        let config_file_path = dir.path().join("config.toml");

        let config_content = r#"
        log_level = "debug"

        [api]
        base_url = "https://console.example.com/"
        timeout_ms = 5000

        [store]
        refetch_on_failure = true
        "#;

        let mut file = std::fs::File::create(&config_file_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let settings =
            get_configuration_with_paths(Some(dir.path().to_path_buf()), nowhere()).unwrap();

        assert_eq!(settings.api.base_url, "https://console.example.com/");
        assert_eq!(settings.api.timeout_ms, 5000);
        assert!(settings.api.with_credentials);
        assert!(settings.store.refetch_on_failure);
        assert_eq!(settings.store.expiry_window_hours, 1);
        assert_eq!(settings.log_level, "debug");
    }

    #[serial]
    #[test]
    fn test_get_configuration_env_override() {
        clear_env();

        std::env::set_var("ACCTDESK__API__LOGIN_ROUTE", "/signin");
        std::env::set_var("ACCTDESK__LOG_LEVEL", "trace");

        let settings = get_configuration_with_paths(nowhere(), nowhere()).unwrap();

        assert_eq!(settings.api.login_route, "/signin");
        assert_eq!(settings.log_level, "trace");

        clear_env();
    }

    #[serial]
    #[test]
    fn test_get_configuration_precedence() {
        clear_env();

        let system_dir = tempdir().unwrap();
        std::fs::write(
            system_dir.path().join("config.toml"),
            "log_level = \"warn\"\n[api]\nbase_url = \"http://system\"\n",
        )
        .unwrap();

        let local_dir = tempdir().unwrap();
        std::fs::write(
            local_dir.path().join("config.toml"),
            "[api]\nbase_url = \"http://local\"\n",
        )
        .unwrap();

        let settings = get_configuration_with_paths(
            Some(local_dir.path().to_path_buf()),
            Some(system_dir.path().to_path_buf()),
        )
        .unwrap();
        assert_eq!(settings.api.base_url, "http://local");
        assert_eq!(settings.log_level, "warn");

        std::env::set_var("ACCTDESK__API__BASE_URL", "http://env");
        let settings = get_configuration_with_paths(
            Some(local_dir.path().to_path_buf()),
            Some(system_dir.path().to_path_buf()),
        )
        .unwrap();
        assert_eq!(settings.api.base_url, "http://env");

        std::env::set_var(API_URL_ENV, "http://shortcut");
        let settings = get_configuration_with_paths(
            Some(local_dir.path().to_path_buf()),
            Some(system_dir.path().to_path_buf()),
        )
        .unwrap();
        assert_eq!(settings.api.base_url, "http://shortcut");

        clear_env();
    }

    #[serial]
    #[test]
    fn test_get_configuration_invalid_value() {
        clear_env();

        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[store]\nexpiry_utc_offset_hours = \"beijing\"\n",
        )
        .unwrap();

        let err =
            get_configuration_with_paths(Some(dir.path().to_path_buf()), nowhere()).unwrap_err();

        assert!(matches!(err, Error::Configuration(_)));
    }
}
