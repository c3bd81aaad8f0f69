use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;

use color_eyre::eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Environment variable holding the log filter, e.g. `SYSMON_LOG=sysmon=debug`.
pub const LOG_ENV: &str = "SYSMON_LOG";

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs the global subscriber. With a log file, JSON lines including
/// span timings go there. Without one, compact output goes to stderr unless
/// `quiet` is set, since the terminal may be owned by the TUI.
pub fn init_tracing(log_file: Option<&Path>, quiet: bool) -> Result<()> {
    match log_file {
        Some(path) => {
            ensure_parent_dir(path)?;
            let file = File::create(path)?;
            let subscriber = tracing_subscriber::fmt()
                .with_ansi(false)
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_env_filter(filter("debug"))
                .with_writer(Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
        }
        None if quiet => Ok(()),
        None => {
            let subscriber = tracing_subscriber::fmt()
                .compact()
                .with_env_filter(filter("warn"))
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
        }
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
