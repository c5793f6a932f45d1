use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use marquee_core::config::data_dir;

const DEFAULT_FILTER: &str = "marquee=info";
const LOG_FILE_PREFIX: &str = "marquee.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log to stderr, and to a daily file under the data directory when
/// `to_file` is set. Keep the returned guard alive until exit so the
/// file writer can flush.
pub fn init(to_file: bool) -> Result<Option<WorkerGuard>> {
    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    if !to_file {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(stderr)
            .try_init()?;
        return Ok(None);
    }

    let dir = data_dir()
        .context("could not resolve data directory")?
        .join("logs");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX));

    tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()?;

    tracing::debug!(dir = %dir.display(), "file logging enabled");
    Ok(Some(guard))
}
