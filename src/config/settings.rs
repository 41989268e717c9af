//! TOML-based configuration for starforge.
//!
//! Supports a config file (starforge.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! output_dir = "./warehouse"
//!
//! [[connections]]
//! source_type = "csv"
//! connection_string = "${SALES_EXPORT_DIR}"
//!
//! [phases]
//! refinement = ["non_nullability", "unique_values", "distinct_primary_keys"]
//! fact = ["many_to_one", "numeric_ratio", "row_count"]
//!
//! [star]
//! fact_threshold = 0.6
//! min_dimensions = 1
//!
//! [naming]
//! fact_table_name_structure = "F_%NAME%"
//! table_name_casing = "uppercase"
//!
//! [csv]
//! delimiter = ";"
//! rows_to_examine = 25
//!
//! [[patterns]]
//! name = "Email"
//! regex = '^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,4}$'
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::connection::ConnectionSettings;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Source connections, processed in order.
    pub connections: Vec<ConnectionSettings>,

    /// Module selection per phase.
    pub phases: PhaseSettings,

    /// Star discovery thresholds.
    pub star: StarSettings,

    /// Naming convention applied during star refinement.
    pub naming: NamingSettings,

    /// Flat-file inference.
    pub csv: CsvSettings,

    /// Value patterns used to name columns.
    pub patterns: Vec<PatternSetting>,

    /// Where generated scripts are written.
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connections: Vec::new(),
            phases: PhaseSettings::default(),
            star: StarSettings::default(),
            naming: NamingSettings::default(),
            csv: CsvSettings::default(),
            patterns: default_patterns(),
            output_dir: PathBuf::from("./output"),
        }
    }
}

/// Ordered module keys per phase.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PhaseSettings {
    pub metadata: Vec<String>,
    pub refinement: Vec<String>,
    pub combination: Vec<String>,
    pub fact: Vec<String>,
    pub dimension: Vec<String>,
    pub star_refinement: Vec<String>,
    pub generation: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

impl Default for PhaseSettings {
    fn default() -> Self {
        Self {
            metadata: keys(&["csv"]),
            refinement: keys(&[
                "non_nullability",
                "unique_values",
                "distinct_primary_keys",
                "name_relations",
                "cardinality",
                "pattern_names",
                "zip_codes",
            ]),
            combination: keys(&["combine_tables"]),
            fact: keys(&["many_to_one", "numeric_ratio", "row_count"]),
            dimension: keys(&["flatten_dimensions", "measures"]),
            star_refinement: keys(&[
                "fact_relation_columns",
                "surrogate_keys",
                "date_time_dimensions",
                "junk_dimension",
                "remove_old_foreign_keys",
                "naming_convention",
                "order_columns",
            ]),
            generation: keys(&["create_script", "etl_script"]),
        }
    }
}

/// Star discovery thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StarSettings {
    /// Minimum averaged fact score (0.0 to 1.0).
    pub fact_threshold: f64,

    /// Star models with this many dimensions or fewer are dropped.
    pub min_dimensions: usize,
}

impl Default for StarSettings {
    fn default() -> Self {
        Self {
            fact_threshold: 0.8,
            min_dimensions: 0,
        }
    }
}

/// Table and column naming convention.
///
/// `%NAME%` in a structure is replaced by the formatted name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NamingSettings {
    pub fact_table_name_structure: String,
    pub dimension_name_structure: String,
    /// One of lowercase, uppercase, pascalcase, camelcase; anything else keeps the name.
    pub table_name_casing: String,
    pub table_strip_underscore: bool,
    pub column_name_structure: String,
    pub column_name_casing: String,
    pub column_strip_underscore: bool,
}

impl Default for NamingSettings {
    fn default() -> Self {
        Self {
            fact_table_name_structure: "Fact_%NAME%".to_string(),
            dimension_name_structure: "Dim_%NAME%".to_string(),
            table_name_casing: "pascalcase".to_string(),
            table_strip_underscore: true,
            column_name_structure: "%NAME%".to_string(),
            column_name_casing: "pascalcase".to_string(),
            column_strip_underscore: true,
        }
    }
}

/// Flat-file inference settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CsvSettings {
    pub delimiter: char,

    /// Data rows inspected for header detection and type inference.
    pub rows_to_examine: usize,
}

impl Default for CsvSettings {
    fn default() -> Self {
        Self {
            delimiter: ',',
            rows_to_examine: 10,
        }
    }
}

/// A named regular expression recognising column values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PatternSetting {
    pub name: String,
    pub regex: String,
}

impl PatternSetting {
    pub fn new(name: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regex: regex.into(),
        }
    }
}

/// Email, phone and two ZIP code forms.
pub fn default_patterns() -> Vec<PatternSetting> {
    vec![
        PatternSetting::new("Email", r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,4}$"),
        PatternSetting::new("Phone", r"^(?:\+|00)[0-9]{2,3}[ -]?[0-9]{8,10}$"),
        PatternSetting::new("ZIP", r"^\d{4}$"),
        PatternSetting::new("ZIP", r"^\d{5}\b(?:[- ]{1}\d{4})?$"),
    ]
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `STARFORGE_CONFIG`
    /// 2. `./starforge.toml`
    /// 3. `~/.config/starforge/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("STARFORGE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("starforge.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("starforge").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Reject values no run could use.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(0.0..=1.0).contains(&self.star.fact_threshold) {
            return Err(SettingsError::InvalidConfig(format!(
                "star.fact_threshold must be within [0, 1], got {}",
                self.star.fact_threshold
            )));
        }
        if self.csv.rows_to_examine == 0 {
            return Err(SettingsError::InvalidConfig(
                "csv.rows_to_examine must be positive".to_string(),
            ));
        }
        for pattern in &self.patterns {
            regex::Regex::new(&pattern.regex).map_err(|e| {
                SettingsError::InvalidConfig(format!("pattern '{}': {e}", pattern.name))
            })?;
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }
        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
