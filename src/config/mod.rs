//! Configuration module for starforge.
//!
//! Handles source connections, module selection, naming and thresholds.

mod connection;
mod settings;

pub use connection::ConnectionSettings;
pub use settings::{
    default_patterns, expand_env_vars, CsvSettings, NamingSettings, PatternSetting,
    PhaseSettings, Settings, SettingsError, StarSettings,
};
