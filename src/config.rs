use crate::database::{DEFAULT_CONNECTION_TIMEOUT, DEFAULT_MAX_CONNECTIONS};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Environment variable consulted for the connection string by default
pub const DEFAULT_CONNECTION_STRING_ENV: &str = "POSTGRES_CONNECTION_STRING";

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error occurred while reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error occurred
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Neither the environment nor the file provide a connection string
    #[error("No database connection string: set {env_var} or [database] url")]
    MissingConnectionString {
        /// Environment variable that was consulted
        env_var: String,
    },

    /// Connection string is not a usable PostgreSQL URL
    #[error("Invalid database URL: {details}")]
    InvalidDatabaseUrl {
        /// What is wrong with it
        details: String,
    },

    /// A value is out of range
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue {
        /// Offending field
        field: String,
        /// Offending value
        value: String,
    },
}

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// Connection URL, used when the environment variable is unset
    #[serde(default)]
    pub url: Option<String>,
    /// Environment variable containing the connection string
    #[serde(default = "default_connection_string_env")]
    pub connection_string_env: String,
    /// Maximum pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            connection_string_env: default_connection_string_env(),
            max_connections: default_max_connections(),
            connection_timeout_secs: default_connection_timeout_secs(),
        }
    }
}

fn default_bind() -> SocketAddr {
    DEFAULT_BIND
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 3000)))
}

fn default_connection_string_env() -> String {
    DEFAULT_CONNECTION_STRING_ENV.to_string()
}

const fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

const fn default_connection_timeout_secs() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT.as_secs()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from `path` when given, falling back to defaults when it is absent
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_file(path)
            }
            None => {
                debug!("No configuration file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()
    }
}

impl DatabaseConfig {
    /// Resolve the connection string
    ///
    /// The environment variable wins over the configured URL.
    pub fn connection_string(&self) -> Result<String, ConfigError> {
        if let Ok(from_env) = env::var(&self.connection_string_env) {
            if !from_env.is_empty() {
                debug!(
                    "Using connection string from environment variable {}",
                    self.connection_string_env
                );
                return Ok(from_env);
            }
            warn!(
                "Environment variable {} is empty, ignoring it",
                self.connection_string_env
            );
        }

        self.url
            .clone()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigError::MissingConnectionString {
                env_var: self.connection_string_env.clone(),
            })
    }

    /// Validate pool limits and the resolved connection URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.max_connections".to_string(),
                value: self.max_connections.to_string(),
            });
        }

        if self.connection_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.connection_timeout_secs".to_string(),
                value: self.connection_timeout_secs.to_string(),
            });
        }

        validate_database_url(&self.connection_string()?)
    }
}

/// Check that a connection string is a `postgres://` or `postgresql://` URL with a host
pub fn validate_database_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidDatabaseUrl {
        details: e.to_string(),
    })?;

    if !matches!(url.scheme(), "postgres" | "postgresql") {
        return Err(ConfigError::InvalidDatabaseUrl {
            details: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidDatabaseUrl {
            details: "missing host".to_string(),
        });
    }

    Ok(())
}
