use std::io;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{config::AppConfig, infrastructure::directories::ResolvedPaths};

const LOG_FILE_PREFIX: &str = "scanner.log";
// sqlx logs every statement at info; the cache runs a query per comment
const QUIET_DEPENDENCIES: &str = "sqlx=warn,hyper=warn,reqwest=warn,html5ever=warn,selectors=warn";

static GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

/// Console plus daily-rolled file output. Safe to call more than once.
pub fn init_tracing(config: &AppConfig, paths: &ResolvedPaths) -> Result<()> {
    GUARD.get_or_try_init::<_, anyhow::Error>(|| {
        let file_appender = tracing_appender::rolling::daily(&paths.logs_dir, LOG_FILE_PREFIX);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(build_filter(&config.logging.level))
            .with(
                fmt::layer()
                    .with_writer(io::stdout)
                    .with_target(true)
                    .with_ansi(true),
            )
            .with(
                fmt::layer()
                    .with_writer(file_writer)
                    .with_target(true)
                    .with_ansi(false),
            )
            .try_init()?;

        tracing::info!(
            target: "lifecycle",
            logs = %paths.logs_dir.display(),
            file = LOG_FILE_PREFIX,
            "tracing initialized"
        );
        Ok(guard)
    })?;
    Ok(())
}

/// `RUST_LOG` wins outright; otherwise the configured level with noisy
/// dependencies turned down, falling back to `info`.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{level},{QUIET_DEPENDENCIES}")))
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{QUIET_DEPENDENCIES}")))
}

