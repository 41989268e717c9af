//! Source connection configuration.
//!
//! Connections can come from the config file or from the environment:
//! - `STARFORGE_SOURCE_TYPE`: source type understood by an inference module (e.g. `csv`)
//! - `STARFORGE_CONNECTION`: connection string handed to that module

use std::env;

use serde::{Deserialize, Serialize};

use super::settings::{expand_env_vars, SettingsError};

/// One configured source connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Source type matched against inference modules (case-insensitive).
    pub source_type: String,

    /// Connection string (supports ${ENV_VAR} expansion).
    pub connection_string: String,
}

impl ConnectionSettings {
    pub fn new(source_type: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            connection_string: connection_string.into(),
        }
    }

    /// Load a single connection from environment variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        let source_type = env::var("STARFORGE_SOURCE_TYPE")
            .map_err(|_| SettingsError::MissingEnvVar("STARFORGE_SOURCE_TYPE".to_string()))?;
        let connection_string = env::var("STARFORGE_CONNECTION")
            .map_err(|_| SettingsError::MissingEnvVar("STARFORGE_CONNECTION".to_string()))?;
        Ok(Self::new(source_type, connection_string))
    }

    /// Get the connection string with environment variables expanded.
    pub fn resolved_connection_string(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.connection_string)
    }

    /// Whether this connection is served by modules of `source_type`.
    pub fn matches(&self, source_type: &str) -> bool {
        self.source_type.eq_ignore_ascii_case(source_type)
    }
}
