//! # Toolkit Configuration
//!
//! Settings for loading and validating material scripts. Every section has
//! defaults so a config file only needs the fields it changes:
//!
//! ```toml
//! log_level = "debug"
//!
//! [loader]
//! texture_extensions = ["png", "dds"]
//!
//! [validation]
//! checks = ["unique_names", "known_keys", "textures"]
//! ```

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::assets::materials::Checks;

/// # Loader Configuration
///
/// Controls which files are picked up when walking a directory tree and how
/// texture references are resolved to files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// File name of material scripts, matched case-insensitively
    pub file_name: String,
    /// Extensions probed, in order, for texture references written without one
    pub texture_extensions: Vec<String>,
}

impl LoaderConfig {
    /// Create a loader configuration with defaults
    pub fn new() -> Self {
        Self {
            file_name: "materials.cs".to_string(),
            texture_extensions: ["png", "dds", "jpg", "jpeg", "bmp", "tga"]
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Set the script file name
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Replace the texture extension list
    pub fn with_texture_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.texture_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.file_name.trim().is_empty() {
            return Err(ConfigError::Invalid("loader.file_name cannot be empty".to_string()));
        }
        if self.texture_extensions.is_empty() {
            return Err(ConfigError::Invalid("loader.texture_extensions cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Validation Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Names of the checks to run (see [`Checks::from_names`])
    pub checks: Vec<String>,
    /// Property names accepted in addition to the recognized set
    pub extra_properties: Vec<String>,
    /// Upper bound for `specularPower`
    pub max_specular_power: f32,
}

impl ValidationConfig {
    /// Create a validation configuration with the default checks
    pub fn new() -> Self {
        Self {
            checks: Checks::default().names().into_iter().map(ToString::to_string).collect(),
            extra_properties: Vec::new(),
            max_specular_power: 128.0,
        }
    }

    /// Resolve the configured check names
    pub fn checks(&self) -> Result<Checks, ConfigError> {
        Checks::from_names(&self.checks).map_err(ConfigError::Invalid)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.checks()?;
        if !self.max_specular_power.is_finite() || self.max_specular_power <= 0.0 {
            return Err(ConfigError::Invalid(
                "validation.max_specular_power must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Toolkit Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Loader settings
    pub loader: LoaderConfig,
    /// Validation settings
    pub validation: ValidationConfig,
}

impl ToolkitConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            log_level: "warn".to_string(),
            loader: LoaderConfig::default(),
            validation: ValidationConfig::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.loader.validate()?;
        self.validation.validate()
    }
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for ToolkitConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ToolkitConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.loader.file_name, "materials.cs");
        assert_eq!(config.validation.checks().unwrap(), Checks::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ToolkitConfig = toml::from_str(
            r#"
log_level = "debug"

[validation]
checks = ["unique_names", "textures"]
extra_properties = ["materialTag0"]
"#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.loader, LoaderConfig::default());
        assert_eq!(
            config.validation.checks().unwrap(),
            Checks::UNIQUE_NAMES | Checks::TEXTURES
        );
        assert_eq!(config.validation.extra_properties, vec!["materialTag0".to_string()]);
    }

    #[test]
    fn test_rejects_unknown_check_and_empty_extensions() {
        let mut config = ToolkitConfig::default();
        config.validation.checks.push("spelling".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ToolkitConfig {
            loader: LoaderConfig::new().with_texture_extensions(Vec::<String>::new()),
            ..ToolkitConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_ron_and_toml() {
        let dir = tempfile::tempdir().unwrap();
        let config = ToolkitConfig::default().with_log_level("info");

        let toml_path = dir.path().join("lint.toml");
        config.save_to_file(&toml_path).unwrap();
        assert_eq!(ToolkitConfig::load_from_file(&toml_path).unwrap(), config);

        let ron_path = dir.path().join("lint.ron");
        config.save_to_file(&ron_path).unwrap();
        assert_eq!(ToolkitConfig::load_from_file(&ron_path).unwrap(), config);

        assert!(matches!(
            config.save_to_file(dir.path().join("lint.yaml")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
