//! Service configuration.
//!
//! Settings come from an optional TOML file (`masterclass.toml`, or the path in
//! `MASTERCLASS_CONFIG`) and are then overridden by environment variables.

use std::env::var;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use tracing::Level;

use crate::model::locale::Locale;

const DEFAULT_CONFIG_PATH: &str = "masterclass.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind: SocketAddr,
    pub storage: StorageBackend,
    pub locale: Locale,
    pub log_level: String,
    /// Maximum accepted request body, in bytes.
    pub body_limit: usize,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
    pub database: DatabaseConfig,
    pub tls: Option<TlsConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            storage: StorageBackend::default(),
            locale: Locale::default(),
            log_level: "info".into(),
            body_limit: 64 * 1024,
            cors_origins: Vec::new(),
            database: DatabaseConfig::default(),
            tls: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection string. Takes precedence over the individual fields below.
    pub url: Option<String>,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: "postgres".into(),
            password: String::new(),
            host: "localhost".into(),
            port: 5432,
            name: "masterclass".into(),
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            ),
        }
    }
}

/// PEM certificate and private key used to serve HTTPS.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Config {
    /// Loads the config file (if any) and applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = var("MASTERCLASS_CONFIG").ok();
        let path = PathBuf::from(explicit.as_deref().unwrap_or(DEFAULT_CONFIG_PATH));

        let mut config = match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_toml(&text)?,
            // The default file is optional, an explicitly named one is not
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {
                Self::default()
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        config.apply_env(|key| var(key).ok())?;
        config.log_level()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str::<Config>(text)?)
    }

    /// Overrides settings with the variables `lookup` resolves.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(bind) = lookup("MASTERCLASS_BIND") {
            self.bind = bind
                .parse::<SocketAddr>()
                .map_err(|e| ConfigError::Invalid {
                    key: "MASTERCLASS_BIND",
                    value: bind.clone(),
                    reason: e.to_string(),
                })?;
        }

        if let Some(storage) = lookup("MASTERCLASS_STORAGE") {
            self.storage = match storage.trim().to_ascii_lowercase().as_str() {
                "postgres" => StorageBackend::Postgres,
                "memory" => StorageBackend::Memory,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "MASTERCLASS_STORAGE",
                        value: storage,
                        reason: "expected 'postgres' or 'memory'".into(),
                    });
                }
            };
        }

        if let Some(locale) = lookup("MASTERCLASS_LOCALE") {
            self.locale = locale
                .parse::<Locale>()
                .map_err(|reason| ConfigError::Invalid {
                    key: "MASTERCLASS_LOCALE",
                    value: locale.clone(),
                    reason,
                })?;
        }

        if let Some(level) = lookup("MASTERCLASS_LOG") {
            self.log_level = level;
        }

        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(user) = lookup("PSQL_NAME") {
            self.database.user = user;
        }
        if let Some(password) = lookup("PSQL_PASS") {
            self.database.password = password;
        }
        if let Some(host) = lookup("PSQL_HOST") {
            self.database.host = host;
        }
        if let Some(name) = lookup("PSQL_DB") {
            self.database.name = name;
        }

        Ok(())
    }

    pub fn log_level(&self) -> Result<Level, ConfigError> {
        self.log_level
            .parse::<Level>()
            .map_err(|e| ConfigError::Invalid {
                key: "log_level",
                value: self.log_level.clone(),
                reason: e.to_string(),
            })
    }
}
