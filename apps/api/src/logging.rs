//! Tracing setup.
//!
//! [`dispatch`] builds one [`Dispatch`] from [`LogLevel`]. `main` hands that
//! handle to the runtime, which enters it on every worker thread; nothing
//! installs a process-wide default. Components log through the `tracing`
//! macros and reach whatever dispatch the current thread carries, so tests
//! can run them under their own via [`tracing::dispatcher::with_default`].
//!
//! Sinks:
//!
//! | sink              | filter                                   |
//! |-------------------|------------------------------------------|
//! | stdout            | `LOGGER_LEVEL` (`RUST_LOG` overrides)    |
//! | `logs/Debug.log`  | debug and above                          |
//! | `logs/Info.log`   | info and above                           |
//! | `logs/Error.log`  | error only                               |
//!
//! Files are appended to and created on demand. The `test` level discards
//! everything and touches no files.

use std::cell::RefCell;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::dispatcher::DefaultGuard;
use tracing::Dispatch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::LogLevel;

/// Directory the level files are written to, relative to the working directory.
pub const LOG_DIR: &str = "logs";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Default filter directives for a configured level.
pub fn default_directives(level: LogLevel) -> String {
    match level {
        LogLevel::Test => "off".to_string(),
        // sqlx logs every statement at info; keep it quiet unless asked
        other => format!("{},sqlx=warn", other.as_str()),
    }
}

/// Builds the stdout filter, letting `RUST_LOG` win except at the `test` level.
pub fn env_filter(level: LogLevel) -> EnvFilter {
    let defaults = default_directives(level);
    if level == LogLevel::Test {
        return EnvFilter::new(defaults);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(defaults))
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn open_append(path: PathBuf) -> Result<Arc<File>, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map(Arc::new)
        .map_err(|source| LoggingError::OpenFile { path, source })
}

fn file_layer(dir: &Path, name: &str, directives: &str) -> Result<BoxedLayer, LoggingError> {
    let file = open_append(dir.join(name))?;
    Ok(fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_filter(EnvFilter::new(directives))
        .boxed())
}

/// Builds the dispatch for `level`, writing level files under `log_dir`.
pub fn dispatch(level: LogLevel, log_dir: &Path) -> Result<Dispatch, LoggingError> {
    if level == LogLevel::Test {
        return Ok(Dispatch::none());
    }

    fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDir {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let layers: Vec<BoxedLayer> = vec![
        fmt::layer()
            .with_target(true)
            .with_filter(env_filter(level))
            .boxed(),
        file_layer(log_dir, "Debug.log", "debug,sqlx=warn")?,
        file_layer(log_dir, "Info.log", "info,sqlx=warn")?,
        file_layer(log_dir, "Error.log", "error")?,
    ];

    Ok(Dispatch::new(tracing_subscriber::registry().with(layers)))
}

thread_local! {
    static THREAD_DISPATCH: RefCell<Option<DefaultGuard>> = const { RefCell::new(None) };
}

/// Makes `dispatch` the current thread's default until [`leave_thread`].
///
/// Meant for runtime `on_thread_start` hooks.
pub fn enter_thread(dispatch: &Dispatch) {
    let guard = tracing::dispatcher::set_default(dispatch);
    THREAD_DISPATCH.with(|slot| *slot.borrow_mut() = Some(guard));
}

/// Drops the guard installed by [`enter_thread`].
pub fn leave_thread() {
    THREAD_DISPATCH.with(|slot| slot.borrow_mut().take());
}
