//! File logging. The terminal belongs to the dashboard, so nothing is written to stdout.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app_dirs::AppDirs;

/// Install the global subscriber. Keep the guard alive until exit or buffered lines are lost.
///
/// `RUST_LOG` wins over `level` when set.
pub fn init_logging(level: &str, path: Option<&Path>) -> io::Result<WorkerGuard> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(AppDirs::log_path)
        .unwrap_or_else(|| PathBuf::from("focusdash.log"));

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "focusdash.log".into());

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init();
    if let Err(err) = installed {
        return Err(io::Error::new(io::ErrorKind::Other, err.to_string()));
    }

    Ok(guard)
}
