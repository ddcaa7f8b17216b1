// src/config/loader.rs
//! Layered configuration loader: defaults, TOML files, environment overrides

use crate::config::{constants::paths, validate_system_config, SystemConfig};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Configuration loader keeping a shared snapshot of the active configuration
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    current_config: Arc<RwLock<SystemConfig>>,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("configuration parse error: {0}")]
    ParseError(String),

    #[error("configuration validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader over the conventional config locations
    pub fn new() -> Self {
        Self::with_paths(Self::discover_config_paths())
    }

    /// Create a loader with custom paths, later paths overriding earlier ones
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            current_config: Arc::new(RwLock::new(SystemConfig::default())),
        }
    }

    /// Load, merge and validate the system configuration using process environment overrides
    pub fn load_system_config(&mut self) -> Result<SystemConfig, ConfigError> {
        self.load_with_env(std::env::vars())
    }

    /// Same as [`load_system_config`](Self::load_system_config) with an explicit environment
    pub fn load_with_env<I>(&mut self, vars: I) -> Result<SystemConfig, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = self.load_and_merge_configs(vars)?;
        *self.current_config.write() = config.clone();
        info!(files = self.config_paths.len(), "configuration loaded");
        Ok(config)
    }

    /// Current configuration snapshot
    pub fn get_current_config(&self) -> SystemConfig {
        self.current_config.read().clone()
    }

    /// Shared handle to the configuration snapshot
    pub fn shared_config(&self) -> Arc<RwLock<SystemConfig>> {
        Arc::clone(&self.current_config)
    }

    /// Reload configuration from disk
    pub fn reload(&mut self) -> Result<SystemConfig, ConfigError> {
        self.load_system_config()
    }

    /// Validate a single configuration file on top of the defaults
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let mut merged = Self::default_value()?;
        let file_value = self.load_config_file(path)?;
        self.merge_toml_values(&mut merged, file_value);
        let config: SystemConfig = merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))?;
        validate_system_config(&config).map_err(ConfigError::Validation)
    }

    /// Export current configuration to file
    pub fn export_config<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let config = self.get_current_config();
        let toml_content =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Paths this loader reads, in merge order
    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(paths::USER_CONFIG_DIR)
                    .join(paths::DEFAULT_CONFIG_FILE),
            );
        }
        paths.push(PathBuf::from(paths::DEFAULT_CONFIG_FILE));
        paths
    }

    fn default_value() -> Result<toml::Value, ConfigError> {
        toml::Value::try_from(SystemConfig::default())
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn load_and_merge_configs<I>(&self, vars: I) -> Result<SystemConfig, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut merged_config = Self::default_value()?;

        for config_path in &self.config_paths {
            match self.load_config_file(config_path) {
                Ok(file_config) => {
                    debug!(path = %config_path.display(), "merging configuration file");
                    self.merge_toml_values(&mut merged_config, file_config);
                }
                // Missing files are optional layers
                Err(ConfigError::FileNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        self.apply_environment_overrides(&mut merged_config, vars);

        let config: SystemConfig = merged_config.try_into().map_err(|e: toml::de::Error| {
            ConfigError::ParseError(format!("failed to deserialize config: {}", e))
        })?;

        validate_system_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
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

    fn merge_toml_values(&self, base: &mut toml::Value, overlay: toml::Value) {
        match (base, overlay) {
            (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
                for (key, value) in overlay_table {
                    if let Some(base_value) = base_table.get_mut(&key) {
                        self.merge_toml_values(base_value, value);
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

    /// `BIOSIG_CLASSIFIER__REJECTION_THRESHOLD=0.7` sets `classifier.rejection_threshold`
    fn apply_environment_overrides<I>(&self, config: &mut toml::Value, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(paths::ENV_PREFIX) else {
                continue;
            };
            let config_key = stripped
                .to_lowercase()
                .split(paths::ENV_PATH_SEPARATOR)
                .collect::<Vec<_>>()
                .join(".");

            debug!(key = %config_key, "applying environment override");
            self.set_nested_value(config, &config_key, self.parse_env_value(&value));
        }
    }

    fn parse_env_value(&self, value: &str) -> toml::Value {
        if let Ok(int_val) = value.parse::<i64>() {
            toml::Value::Integer(int_val)
        } else if let Ok(float_val) = value.parse::<f64>() {
            toml::Value::Float(float_val)
        } else if let Ok(bool_val) = value.parse::<bool>() {
            toml::Value::Boolean(bool_val)
        } else {
            toml::Value::String(value.to_string())
        }
    }

    fn set_nested_value(&self, config: &mut toml::Value, path: &str, value: toml::Value) {
        let parts: Vec<&str> = path.split('.').filter(|p| !p.is_empty()).collect();
        let Some((last, parents)) = parts.split_last() else {
            return;
        };

        let mut current = config;
        for part in parents {
            current = match current {
                toml::Value::Table(table) => table
                    .entry(part.to_string())
                    .or_insert_with(|| toml::Value::Table(toml::value::Table::new())),
                _ => return,
            };
        }

        if let toml::Value::Table(table) = current {
            // Integers written into float fields would fail to deserialize
            let value = match (table.get(*last), value) {
                (Some(toml::Value::Float(_)), toml::Value::Integer(i)) => toml::Value::Float(i as f64),
                (_, value) => value,
            };
            table.insert(last.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env() -> Vec<(String, String)> {
        Vec::new()
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let mut loader = ConfigLoader::with_paths(vec![PathBuf::from("/nonexistent/biosignal.toml")]);
        let config = loader.load_with_env(no_env()).unwrap();
        assert_eq!(config, SystemConfig::default());
    }

    #[test]
    fn test_file_layers_merge_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.toml");
        let overlay = dir.path().join("overlay.toml");

        std::fs::File::create(&base)
            .unwrap()
            .write_all(b"[sampling]\nemg_rate_hz = 2000\ngsr_rate_hz = 200\n")
            .unwrap();
        std::fs::File::create(&overlay)
            .unwrap()
            .write_all(b"[sampling]\ngsr_rate_hz = 100\n")
            .unwrap();

        let mut loader = ConfigLoader::with_paths(vec![base, overlay]);
        let config = loader.load_with_env(no_env()).unwrap();
        assert_eq!(config.sampling.emg_rate_hz, 2000);
        assert_eq!(config.sampling.gsr_rate_hz, 100);
        assert_eq!(loader.get_current_config(), config);
    }

    #[test]
    fn test_environment_overrides() {
        let mut loader = ConfigLoader::with_paths(Vec::new());
        let env = vec![
            ("BIOSIG_CLASSIFIER__REJECTION_THRESHOLD".to_string(), "0.7".to_string()),
            ("BIOSIG_CALIBRATION__DURATION_SECS".to_string(), "30".to_string()),
            ("BIOSIG_FILTERS__EMG_DC_BLOCKER".to_string(), "true".to_string()),
            ("UNRELATED".to_string(), "1".to_string()),
        ];
        let config = loader.load_with_env(env).unwrap();
        assert!((config.classifier.rejection_threshold - 0.7).abs() < 1e-6);
        assert_eq!(config.calibration.duration_secs, 30.0);
        assert!(config.filters.emg_dc_blocker);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let mut loader = ConfigLoader::with_paths(Vec::new());
        let env = vec![("BIOSIG_CLASSIFIER__REJECTION_THRESHOLD".to_string(), "1.5".to_string())];
        match loader.load_with_env(env) {
            Err(ConfigError::Validation(errors)) => assert!(!errors.is_empty()),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[sampling\nemg_rate_hz = ").unwrap();

        let mut loader = ConfigLoader::with_paths(vec![path]);
        assert!(matches!(loader.load_with_env(no_env()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_export_then_validate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exported.toml");

        let loader = ConfigLoader::with_paths(Vec::new());
        loader.export_config(&path).unwrap();
        assert!(loader.validate_config_file(&path).is_ok());
    }

    #[test]
    fn test_shared_snapshot_follows_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("biosignal.toml");
        std::fs::write(&path, "[classifier]\nrejection_threshold = 0.7\n").unwrap();

        let mut loader = ConfigLoader::with_paths(vec![path.clone()]);
        let shared = loader.shared_config();
        loader.load_with_env(no_env()).unwrap();
        assert_eq!(shared.read().classifier.rejection_threshold, 0.7);

        std::fs::write(&path, "[classifier]\nrejection_threshold = 0.9\n").unwrap();
        loader.reload().unwrap();
        assert_eq!(shared.read().classifier.rejection_threshold, 0.9);
        assert_eq!(loader.get_current_config().classifier.rejection_threshold, 0.9);
    }
}
