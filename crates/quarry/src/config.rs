//! Connection configuration.

use crate::connection::ConnectionOptions;
use crate::error::{DbError, DbResult};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Connection target and driver options.
///
/// Either `url` (a libpq-style connection string or `postgres://` URL) or the
/// discrete `host`/`port`/`database`/`username`/`password` fields are used;
/// `url` wins when both are set.
///
/// # Example
///
/// ```ignore
/// let config = DatabaseConfig::new()
///     .host("localhost")
///     .database("app")
///     .username("app")
///     .password("secret")
///     .slow_query(Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub options: DriverOptions,
}

/// Driver-level options.
///
/// Errors are always returned to the caller and statements are always
/// server-prepared, so there are no switches for either.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverOptions {
    /// Connect timeout in seconds.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// `application_name` reported to the server.
    #[serde(default)]
    pub application_name: Option<String>,
    /// Statements slower than this (milliseconds) are logged at WARN.
    #[serde(default)]
    pub slow_query_ms: Option<u64>,
    /// Truncate logged SQL to this many bytes. `None` means no truncation.
    #[serde(default = "default_max_logged_sql_length")]
    pub max_logged_sql_length: Option<usize>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_max_logged_sql_length() -> Option<usize> {
    Some(200)
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: None,
            application_name: None,
            slow_query_ms: None,
            max_logged_sql_length: default_max_logged_sql_length(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_host(),
            port: default_port(),
            database: String::new(),
            username: String::new(),
            password: None,
            options: DriverOptions::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    database: DatabaseConfig,
}

impl DatabaseConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration from a connection URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Configuration from the `DATABASE_URL` environment variable.
    pub fn from_env() -> DbResult<Self> {
        std::env::var("DATABASE_URL")
            .map(Self::from_url)
            .map_err(|_| DbError::config("DATABASE_URL is not set"))
    }

    /// Parse a TOML document with a `[database]` table.
    ///
    /// `${VAR}` references in string fields are expanded from the environment.
    ///
    /// ```toml
    /// [database]
    /// host = "localhost"
    /// database = "app"
    /// username = "app"
    /// password = "${APP_DB_PASSWORD}"
    ///
    /// [database.options]
    /// slow_query_ms = 250
    /// ```
    pub fn from_toml_str(raw: &str) -> DbResult<Self> {
        let file: ConfigFile = toml::from_str(raw)
            .map_err(|e| DbError::config(format!("failed to parse config: {e}")))?;
        let mut config = file.database;
        config.expand_env()?;
        Ok(config)
    }

    /// Read and parse a TOML config file (see [`DatabaseConfig::from_toml_str`]).
    pub fn load(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DbError::config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.options.application_name = Some(name.into());
        self
    }

    /// Log statements slower than `threshold` at WARN.
    pub fn slow_query(mut self, threshold: Duration) -> Self {
        self.options.slow_query_ms = Some(threshold.as_millis() as u64);
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_logged_sql_length(mut self, len: usize) -> Self {
        self.options.max_logged_sql_length = Some(len);
        self
    }

    /// Build the `tokio_postgres` connection config.
    pub fn to_pg_config(&self) -> DbResult<tokio_postgres::Config> {
        let mut pg = match &self.url {
            Some(url) => url
                .parse::<tokio_postgres::Config>()
                .map_err(|e| DbError::config(format!("invalid database url: {e}")))?,
            None => {
                let mut pg = tokio_postgres::Config::new();
                pg.host(&self.host).port(self.port);
                if !self.database.is_empty() {
                    pg.dbname(&self.database);
                }
                if !self.username.is_empty() {
                    pg.user(&self.username);
                }
                if let Some(password) = &self.password {
                    pg.password(password);
                }
                pg
            }
        };

        if let Some(secs) = self.options.connect_timeout_secs {
            pg.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(name) = &self.options.application_name {
            pg.application_name(name);
        }
        Ok(pg)
    }

    /// Logging options for connections opened from this config.
    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            slow_query_threshold: self.options.slow_query_ms.map(Duration::from_millis),
            max_sql_length: self.options.max_logged_sql_length,
        }
    }

    fn expand_env(&mut self) -> DbResult<()> {
        if let Some(url) = self.url.as_mut() {
            *url = expand_env_vars(url)?;
        }
        self.host = expand_env_vars(&self.host)?;
        self.database = expand_env_vars(&self.database)?;
        self.username = expand_env_vars(&self.username)?;
        if let Some(password) = self.password.as_mut() {
            *password = expand_env_vars(password)?;
        }
        Ok(())
    }
}

/// Replace every `${NAME}` in `input` with the value of environment variable `NAME`.
fn expand_env_vars(input: &str) -> DbResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find("${") {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 2..];
        let close = tail
            .find('}')
            .ok_or_else(|| DbError::config("`${` in config value is never closed"))?;
        out.push_str(&env_value(&tail[..close])?);
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn env_value(name: &str) -> DbResult<String> {
    if name.is_empty() {
        return Err(DbError::config("`${}` in config value names no variable"));
    }
    std::env::var(name)
        .map_err(|_| DbError::config(format!("config references unset env var `{name}`")))
}
