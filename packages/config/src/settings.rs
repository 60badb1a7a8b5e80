// ABOUTME: Layered settings loader (defaults, TOML file, environment)
// ABOUTME: Environment variables always win over values from the settings file

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::constants::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
}

/// Resolved service settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub app_env: String,
    pub host: String,
    pub port: u16,
    pub cors_origin: Option<String>,
    pub database_url: String,
    pub database_password: Option<String>,
    pub db_max_connections: u32,
    pub db_connect_retries: u32,
    pub log_level: String,
    pub app_version: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_env: DEFAULT_APP_ENV.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origin: None,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_password: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            db_connect_retries: DEFAULT_DB_CONNECT_RETRIES,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            app_version: None,
        }
    }
}

impl Settings {
    /// Load settings from `.env`, the settings file and the process environment.
    ///
    /// The settings file is optional. Its `[default]` table is applied first,
    /// then the table named after `APP_ENV`, then environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = env::var(METATAG_SETTINGS_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_FILE));
        let file = read_optional(&path)?;

        Self::from_sources(file.as_deref(), |key| env::var(key).ok())
    }

    /// Build settings from settings-file content and an environment lookup
    pub fn from_sources<F>(file: Option<&str>, env_lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = env_lookup(APP_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_APP_ENV.to_string());

        let mut values = BTreeMap::new();

        if let Some(content) = file {
            let table: toml::Table = content.parse()?;
            for section in ["default", app_env.as_str()] {
                match table.get(section) {
                    Some(toml::Value::Table(section_values)) => {
                        merge_table(&mut values, section_values)
                    }
                    Some(_) => warn!("Settings section [{}] is not a table, ignoring", section),
                    None => debug!("Settings section [{}] not present", section),
                }
            }
        }

        for key in SETTING_KEYS {
            if let Some(value) = env_lookup(key) {
                values.insert(key.to_string(), value);
            }
        }

        Self::from_values(app_env, &values)
    }

    fn from_values(app_env: String, values: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_number(values, PORT, DEFAULT_PORT)?;
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        Ok(Self {
            app_env,
            host: text(values, HOST).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            cors_origin: text(values, CORS_ORIGIN),
            database_url: text(values, DATABASE_URL)
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            database_password: text(values, DATABASE_PASSWORD),
            db_max_connections: parse_number(values, DB_MAX_CONNECTIONS, DEFAULT_DB_MAX_CONNECTIONS)?,
            db_connect_retries: parse_number(values, DB_CONNECT_RETRIES, DEFAULT_DB_CONNECT_RETRIES)?,
            log_level: text(values, LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            app_version: text(values, APP_VERSION),
        })
    }

    /// Version reported by the service, or the unset placeholder
    pub fn version(&self) -> &str {
        self.app_version.as_deref().unwrap_or(UNSET)
    }

    /// Settings snapshot safe to expose over the health endpoint
    pub fn diagnostics(&self) -> BTreeMap<&'static str, String> {
        let mut report = BTreeMap::new();
        report.insert(APP_ENV, self.app_env.clone());
        report.insert(HOST, self.host.clone());
        report.insert(PORT, self.port.to_string());
        report.insert(
            CORS_ORIGIN,
            self.cors_origin.clone().unwrap_or_else(|| UNSET.to_string()),
        );
        report.insert(DATABASE_URL, mask_database_url(&self.database_url));
        report.insert(DATABASE_PASSWORD, mask_secret(self.database_password.as_deref()));
        report.insert(DB_MAX_CONNECTIONS, self.db_max_connections.to_string());
        report.insert(LOG_LEVEL, self.log_level.clone());
        report.insert(APP_VERSION, self.version().to_string());
        report
    }
}

/// Replace every character of a secret with `*`
pub fn mask_secret(secret: Option<&str>) -> String {
    match secret {
        Some(value) if !value.is_empty() => "*".repeat(value.chars().count()),
        _ => UNSET.to_string(),
    }
}

/// Mask the password component of a database URL, if it has one
pub fn mask_database_url(database_url: &str) -> String {
    let Ok(mut url) = Url::parse(database_url) else {
        return database_url.to_string();
    };

    let Some(password) = url.password().map(str::to_owned) else {
        return database_url.to_string();
    };

    let masked = "*".repeat(password.chars().count());
    if url.set_password(Some(&masked)).is_err() {
        return UNSET.to_string();
    }
    url.to_string()
}

fn read_optional(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => {
            debug!("Loaded settings file: {}", path.display());
            Ok(Some(content))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No settings file at {}, using defaults", path.display());
            Ok(None)
        }
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn merge_table(values: &mut BTreeMap<String, String>, table: &toml::Table) {
    for (key, value) in table {
        let rendered = match value {
            toml::Value::String(s) => s.clone(),
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            _ => {
                warn!("Ignoring non-scalar setting: {}", key);
                continue;
            }
        };
        values.insert(key.to_uppercase(), rendered);
    }
}

fn text(values: &BTreeMap<String, String>, key: &str) -> Option<String> {
    values
        .get(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_number<T: FromStr>(
    values: &BTreeMap<String, String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match values.get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
        }),
        None => Ok(default),
    }
}
