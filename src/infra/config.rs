//! Application configuration.
//!
//! Values come from the process environment (after loading `.env`). Keys
//! follow the `section.key` → `SECTION_KEY` convention, e.g. `server.address`
//! is read from `SERVER_ADDRESS`. Named databases are declared as
//! `DATABASES_<NAME>_URI`; the `main` database is mandatory.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderName;
use secrecy::SecretString;

use super::observability::{LogFormat, LoggerConfig};
use crate::domain::ConfigError;

/// Name of the mandatory database.
pub const MAIN_DATABASE: &str = "main";

const DATABASES_PREFIX: &str = "DATABASES_";
const URI_SUFFIX: &str = "_URI";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub address: SocketAddr,
    /// Normalized: leading slash, no trailing slash, or empty for root.
    pub api_prefix: String,
    pub trace_header: HeaderName,
    pub request_timeout: Duration,
    pub shutdown_timeout: Duration,
}

#[derive(Debug)]
pub struct DatabaseConfig {
    /// Connection URIs by lowercase database name.
    pub uris: BTreeMap<String, SecretString>,
    pub connect_attempts: u32,
    pub connect_backoff: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub path: String,
}

#[derive(Debug)]
pub struct SentryConfig {
    /// `None` disables error capture.
    pub dsn: Option<SecretString>,
    pub environment: String,
}

#[derive(Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub metrics: MetricsConfig,
    pub logger: LoggerConfig,
    pub sentry: SentryConfig,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` for missing mandatory keys or unparsable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Builds the configuration from an explicit set of variables.
    ///
    /// # Errors
    /// Returns `ConfigError` for missing mandatory keys or unparsable values.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = Vars(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );

        Ok(Self {
            server: server_config(&vars)?,
            database: database_config(&vars)?,
            metrics: metrics_config(&vars)?,
            logger: LoggerConfig {
                level: vars.string("LOGGER_LEVEL", "info"),
                format: vars.parse("LOGGER_FORMAT", LogFormat::default())?,
            },
            sentry: SentryConfig {
                dsn: vars
                    .get("SENTRY_DSN")
                    .map(|dsn| SecretString::from(dsn.to_string())),
                environment: vars.string("SENTRY_ENVIRONMENT", "development"),
            },
        })
    }
}

struct Vars(HashMap<String, String>);

impl Vars {
    /// Non-empty value of `key`, trimmed.
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    fn bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key).map(str::to_ascii_lowercase).as_deref() {
            None => Ok(default),
            Some("true" | "1" | "yes" | "on") => Ok(true),
            Some("false" | "0" | "no" | "off") => Ok(false),
            Some(other) => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{other:?} is not a boolean"),
            }),
        }
    }

    fn secs(&self, key: &str, default: u64) -> Result<Duration, ConfigError> {
        self.parse(key, default).map(Duration::from_secs)
    }
}

fn server_config(vars: &Vars) -> Result<ServerConfig, ConfigError> {
    let default_address = SocketAddr::from(([0, 0, 0, 0], 8080));

    Ok(ServerConfig {
        address: vars.parse("SERVER_ADDRESS", default_address)?,
        api_prefix: normalize_prefix(&vars.string("SERVER_API_PREFIX", "/api/v1/hello")),
        trace_header: vars.parse("SERVER_TRACE_HEADER", HeaderName::from_static("x-trace-id"))?,
        request_timeout: vars.secs("SERVER_REQUEST_TIMEOUT_SECS", 15)?,
        shutdown_timeout: vars.secs("SERVER_SHUTDOWN_TIMEOUT_SECS", 10)?,
    })
}

fn database_config(vars: &Vars) -> Result<DatabaseConfig, ConfigError> {
    let mut uris = BTreeMap::new();
    for (key, value) in &vars.0 {
        let Some(name) = key
            .strip_prefix(DATABASES_PREFIX)
            .and_then(|rest| rest.strip_suffix(URI_SUFFIX))
        else {
            continue;
        };
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            continue;
        }
        uris.insert(
            name.to_ascii_lowercase(),
            SecretString::from(value.to_string()),
        );
    }

    if uris.is_empty()
        && let Some(uri) = vars.get("DATABASE_URI")
    {
        uris.insert(
            MAIN_DATABASE.to_string(),
            SecretString::from(uri.to_string()),
        );
    }

    if !uris.contains_key(MAIN_DATABASE) {
        return Err(ConfigError::MissingEnvVar("DATABASE_URI".to_string()));
    }

    let connect_attempts = vars.parse("DATABASE_CONNECT_ATTEMPTS", 5_u32)?;
    if connect_attempts == 0 {
        return Err(ConfigError::InvalidValue {
            key: "DATABASE_CONNECT_ATTEMPTS".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    Ok(DatabaseConfig {
        uris,
        connect_attempts,
        connect_backoff: vars.secs("DATABASE_CONNECT_BACKOFF_SECS", 2)?,
    })
}

fn metrics_config(vars: &Vars) -> Result<MetricsConfig, ConfigError> {
    let path = vars.string("METRICS_PATH", "/metrics");
    if !path.starts_with('/') {
        return Err(ConfigError::InvalidValue {
            key: "METRICS_PATH".to_string(),
            message: format!("{path:?} must start with '/'"),
        });
    }

    Ok(MetricsConfig {
        enabled: vars.bool("METRICS_ENABLED", true)?,
        path,
    })
}

/// `api/v1/` → `/api/v1`; `/` → empty.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
