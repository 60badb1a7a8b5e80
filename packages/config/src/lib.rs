// ABOUTME: Configuration for the Metatag service
// ABOUTME: Setting key constants and the layered settings loader

pub mod constants;
pub mod settings;

pub use settings::{mask_database_url, mask_secret, ConfigError, Settings};
