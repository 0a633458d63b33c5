use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "GALAXY_LOG";
const LOG_FILE_PREFIX: &str = "galaxy-trader.log";

/// Install the global subscriber.
///
/// `GALAXY_LOG` overrides `log_level`. Console output goes to stderr so
/// stdout stays machine-readable. With `log_dir`, events are also written
/// to a daily-rolling file; keep the returned guard alive until exit.
pub fn init_tracing(log_level: &str, log_format: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| log_level.to_string());
    let env_filter = EnvFilter::try_new(&filter).with_context(|| format!("invalid log filter: {filter}"))?;

    let json = match log_format.trim().to_lowercase().as_str() {
        "json" => true,
        "text" => false,
        other => bail!("unknown log format: {other} (expected text or json)"),
    };
    let (text_layer, json_layer) = if json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr)), None)
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log dir {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}
