// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all setting keys used across Metatag

// Environment selection
pub const APP_ENV: &str = "APP_ENV";
pub const METATAG_SETTINGS_FILE: &str = "METATAG_SETTINGS_FILE";

// Server
pub const HOST: &str = "HOST";
pub const PORT: &str = "PORT";
pub const CORS_ORIGIN: &str = "CORS_ORIGIN";

// Database
pub const DATABASE_URL: &str = "DATABASE_URL";
pub const DATABASE_PASSWORD: &str = "DATABASE_PASSWORD";
pub const DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
pub const DB_CONNECT_RETRIES: &str = "DB_CONNECT_RETRIES";

// Diagnostics
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const APP_VERSION: &str = "APP_VERSION";

/// Every key the settings loader reads from files and the environment
pub const SETTING_KEYS: &[&str] = &[
    HOST,
    PORT,
    CORS_ORIGIN,
    DATABASE_URL,
    DATABASE_PASSWORD,
    DB_MAX_CONNECTIONS,
    DB_CONNECT_RETRIES,
    LOG_LEVEL,
    APP_VERSION,
];

// Defaults
pub const DEFAULT_APP_ENV: &str = "development";
pub const DEFAULT_SETTINGS_FILE: &str = "config/settings.toml";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://metatag.db";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DB_CONNECT_RETRIES: u32 = 5;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Placeholder reported for settings that have no value
pub const UNSET: &str = "-----";
