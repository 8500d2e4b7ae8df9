//! API configuration module.
//!
//! Configuration is read from environment variables. Every variable is
//! required; a `.env` file in the working directory is loaded first by
//! `main` when present.
//!
//! | Variable            | Example     |
//! |---------------------|-------------|
//! | `HTTP_PORT`         | `8080`      |
//! | `HTTP_TIMEOUT`      | `10` (secs) |
//! | `DATABASE_HOST`     | `localhost` |
//! | `DATABASE_PORT`     | `5432`      |
//! | `DATABASE_USER`     | `songbook`  |
//! | `DATABASE_PASSWORD` | `secret`    |
//! | `DATABASE_NAME`     | `songbook`  |
//! | `LOGGER_LEVEL`      | `info`      |

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use songbook_db::DbConfig;

/// API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub logger: LoggerConfig,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Listen port (bound on all interfaces).
    pub port: u16,

    /// Per-request read/write timeout.
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoggerConfig {
    pub level: LogLevel,
}

/// Log verbosity. `Test` silences all output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Test,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Test => "test",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "test" => Ok(LogLevel::Test),
            _ => Err(()),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs: u64 = {
            let raw = required(&lookup, "HTTP_TIMEOUT")?;
            let raw = raw.trim();
            raw.strip_suffix('s')
                .unwrap_or(raw)
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_TIMEOUT".to_string()))?
        };
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("HTTP_TIMEOUT".to_string()));
        }

        let config = ApiConfig {
            http: HttpConfig {
                port: parsed(&lookup, "HTTP_PORT")?,
                timeout: Duration::from_secs(timeout_secs),
            },
            database: DatabaseConfig {
                host: required(&lookup, "DATABASE_HOST")?,
                port: parsed(&lookup, "DATABASE_PORT")?,
                user: required(&lookup, "DATABASE_USER")?,
                password: required(&lookup, "DATABASE_PASSWORD")?,
                name: required(&lookup, "DATABASE_NAME")?,
            },
            logger: LoggerConfig {
                level: parsed(&lookup, "LOGGER_LEVEL")?,
            },
        };

        Ok(config)
    }

    /// Address the HTTP listener binds to.
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.http.port))
    }

    /// Database settings for the pool. Migrations are run explicitly by `main`.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(
            &self.database.host,
            self.database.port,
            &self.database.user,
            &self.database.password,
            &self.database.name,
        )
        .run_migrations(false)
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or_else(|| ConfigError::MissingRequired(key.to_string()))
}

fn parsed<T, F>(lookup: &F, key: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    required(lookup, key)?
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
