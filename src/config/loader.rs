// src/config/loader.rs
//! Layered TOML configuration loader
//!
//! Files are merged over the built-in defaults in order, later files winning.
//! Tables merge key by key; any other value (including the `[[bands]]` array)
//! is replaced wholesale.

use crate::config::{constants::paths, AnalysisConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration validation errors: {}", .0.join("; "))]
    ValidationError(Vec<String>),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Configuration loader
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Loader over the conventional local paths
    pub fn new() -> Self {
        Self {
            config_paths: vec![
                PathBuf::from(paths::DEFAULT_CONFIG_FILE),
                PathBuf::from(paths::LOCAL_CONFIG_FILE),
            ],
        }
    }

    /// Create loader with custom paths
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self { config_paths: paths }
    }

    /// Paths consulted, lowest precedence first
    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load and validate the merged configuration
    ///
    /// Missing files are skipped; unreadable or malformed ones are errors.
    pub fn load(&self) -> Result<AnalysisConfig, ConfigError> {
        let mut merged = toml::Value::try_from(AnalysisConfig::default())
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        for config_path in &self.config_paths {
            match self.load_config_file(config_path) {
                Ok(file_config) => {
                    debug!(path = %config_path.display(), "merging configuration file");
                    merge_toml_values(&mut merged, file_config);
                }
                Err(ConfigError::FileNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        let config: AnalysisConfig = merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))?;
        config
            .validate_consistency()
            .map_err(ConfigError::ValidationError)?;

        info!(
            bands = config.bands.len(),
            fmin = config.spectral.fmin,
            fmax = config.spectral.fmax,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Validate a single configuration file merged over the defaults
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        ConfigLoader::with_paths(vec![path.as_ref().to_path_buf()])
            .load()
            .map(|_| ())
    }

    /// Export a configuration to file
    pub fn export_config<P: AsRef<Path>>(
        &self,
        config: &AnalysisConfig,
        path: P,
    ) -> Result<(), ConfigError> {
        let toml_content =
            toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<toml::Value, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: toml::Value = toml::from_str(&content)?;

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundaryPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let loader = ConfigLoader::with_paths(vec![PathBuf::from("/nonexistent/eeg.toml")]);
        let config = loader.load().unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let file = write_temp(
            r#"
boundary_policy = "half_open"

[spectral]
fmax = 45.0
        "#,
        );

        let config = ConfigLoader::with_paths(vec![file.path().to_path_buf()]).load().unwrap();
        assert_eq!(config.boundary_policy, BoundaryPolicy::HalfOpen);
        assert_eq!(config.spectral.fmax, 45.0);
        assert_eq!(config.spectral.fmin, 1.0);
        assert_eq!(config.bands.len(), 5);
    }

    #[test]
    fn test_band_catalog_replaced() {
        let file = write_temp(
            r#"
[[bands]]
name = "Mu"
low_hz = 8.0
high_hz = 13.0

[[bands]]
name = "SMR"
low_hz = 12.0
high_hz = 15.0
        "#,
        );

        let config = ConfigLoader::with_paths(vec![file.path().to_path_buf()]).load().unwrap();
        assert_eq!(config.bands.names(), vec!["Mu", "SMR"]);
    }

    #[test]
    fn test_later_files_take_precedence() {
        let first = write_temp("[spectral]\nfmax = 60.0");
        let second = write_temp("[spectral]\nfmax = 40.0");

        let loader = ConfigLoader::with_paths(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        assert_eq!(loader.load().unwrap().spectral.fmax, 40.0);
    }

    #[test]
    fn test_invalid_config_validation() {
        let loader = ConfigLoader::new();
        let file = write_temp("[spectral]\nwindow_seconds = 2.0\noverlap_seconds = 3.0");

        assert!(matches!(
            loader.validate_config_file(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let file = write_temp("[spectral\nfmax = ");
        let loader = ConfigLoader::with_paths(vec![file.path().to_path_buf()]);
        assert!(matches!(loader.load(), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_config_export_round_trip() {
        let loader = ConfigLoader::new();
        let temp_file = NamedTempFile::new().unwrap();
        let config = AnalysisConfig::default();

        loader.export_config(&config, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("[spectral]"));
        assert!(content.contains("[[bands]]"));

        let reloaded = ConfigLoader::with_paths(vec![temp_file.path().to_path_buf()])
            .load()
            .unwrap();
        assert_eq!(reloaded, config);
    }
}
