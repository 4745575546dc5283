use std::path::PathBuf;

use acctdesk_core::config::Settings;
use acctdesk_core::Error;
use directories::ProjectDirs;
use tracing::subscriber::set_global_default;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Directory the daily log files are written to
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "acctdesk", "acctdesk")
        .map(|d| d.data_local_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// `RUST_LOG` when set, otherwise the configured `log_level`
pub fn env_filter(settings: &Settings) -> Result<EnvFilter, Error> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&settings.log_level).map_err(|e| {
        Error::Configuration(format!("invalid log_level '{}': {}", settings.log_level, e))
    })
}

/// Install the global subscriber described by `settings`.
///
/// Pretty output goes to stdout. A daily rolling file named after
/// `log_file` gets plain text, or JSON lines when `log_json` is set.
/// Keep the returned guard alive for the lifetime of the process.
pub fn init_subscriber(settings: &Settings) -> Result<WorkerGuard, Error> {
    let env_filter = env_filter(settings)?;

    LogTracer::init().map_err(|e| Error::Other(format!("failed to bridge log records: {}", e)))?;

    let file_appender =
        tracing_appender::rolling::daily(log_dir(), format!("{}.log", settings.log_file));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let (json_layer, text_layer) = if settings.log_json {
        (Some(fmt::layer().json().with_writer(non_blocking)), None)
    } else {
        (
            None,
            Some(fmt::layer().with_ansi(false).with_writer(non_blocking)),
        )
    };

    let subscriber = Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_target(false).pretty())
        .with(json_layer)
        .with(text_layer);

    set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("failed to set global tracing subscriber: {}", e)))?;

    Ok(guard)
}
