//! The `PreviewConfig` struct, its validation, and YAML persistence.
//!
//! Covers:
//! - `load` / `load_from` / `save_to` (YAML file I/O with atomic write)
//! - XDG-style path helpers (`config_path`, `config_dir`)
//! - Derived helpers (`script_filter`, `title_for`)

use crate::error::ConfigError;
use crate::filter::ScriptFilter;
use crate::types::{LogLevel, ProtocolVariant};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "jscad-preview";
const CONFIG_FILE: &str = "config.yaml";

/// Runtime configuration for the preview host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Recognised script-file suffixes, without the leading dot
    #[serde(default = "crate::defaults::script_extensions")]
    pub script_extensions: Vec<String>,

    /// Name a single-file target is mounted under in the source tree
    #[serde(default = "crate::defaults::single_file_name")]
    pub single_file_name: String,

    /// Synthetic root segment every tree hangs from
    #[serde(default = "crate::defaults::root_segment")]
    pub root_segment: String,

    /// Panel title prefix; the title is `"<prefix> (<name>)"`
    #[serde(default = "crate::defaults::title_prefix")]
    pub title_prefix: String,

    /// Viewer message variant used for tree updates
    pub protocol: ProtocolVariant,

    /// Coalescing window for bursts of change events (0 disables)
    #[serde(default = "crate::defaults::debounce_ms")]
    pub debounce_ms: u64,

    /// Viewer script reference placed in the preview document
    #[serde(default = "crate::defaults::viewer_script")]
    pub viewer_script: String,

    /// Bridging script reference placed in the preview document
    #[serde(default = "crate::defaults::bridge_script")]
    pub bridge_script: String,

    /// Debug log verbosity
    pub log_level: LogLevel,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            script_extensions: crate::defaults::script_extensions(),
            single_file_name: crate::defaults::single_file_name(),
            root_segment: crate::defaults::root_segment(),
            title_prefix: crate::defaults::title_prefix(),
            protocol: ProtocolVariant::default(),
            debounce_ms: crate::defaults::debounce_ms(),
            viewer_script: crate::defaults::viewer_script(),
            bridge_script: crate::defaults::bridge_script(),
            log_level: LogLevel::default(),
        }
    }
}

impl PreviewConfig {
    /// Load configuration from the default path, writing defaults out when
    /// no file exists yet.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        log::info!("Config path: {:?}", config_path);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            log::info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            if let Err(e) = config.save_to(&config_path) {
                // A read-only home must not prevent previews
                log::warn!("Failed to save default config: {}", e);
            }
            Ok(config)
        }
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path)?;
        let config: PreviewConfig = serde_yaml_ng::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml_ng::to_string(self)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Get the configuration file path (using XDG convention)
    pub fn config_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    /// Get the configuration directory path (using XDG convention)
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join(APP_DIR)
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join(APP_DIR)
            } else {
                PathBuf::from(".")
            }
        }
    }

    /// Check field values that the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.script_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "script_extensions must list at least one extension".to_string(),
            ));
        }
        for ext in &self.script_extensions {
            if ext.is_empty() || ext.contains('.') || ext.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "script_extensions entry {ext:?} must be a bare suffix such as \"js\""
                )));
            }
        }
        if self.root_segment.is_empty() || self.root_segment.contains('/') {
            return Err(ConfigError::Validation(format!(
                "root_segment {:?} must be a single non-empty path segment",
                self.root_segment
            )));
        }
        if self.single_file_name.contains('/')
            || !self.script_filter().matches(&self.single_file_name)
        {
            return Err(ConfigError::Validation(format!(
                "single_file_name {:?} must be a script file name matching script_extensions",
                self.single_file_name
            )));
        }
        Ok(())
    }

    pub fn script_filter(&self) -> ScriptFilter {
        ScriptFilter::new(self.script_extensions.iter().cloned())
    }

    /// Panel title for a target, derived from its final path segment.
    pub fn title_for(&self, target: &Path) -> String {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| target.display().to_string());
        format!("{} ({})", self.title_prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: PreviewConfig =
            serde_yaml_ng::from_str("script_extensions: [js, jscad]\nprotocol: update\n")
                .unwrap();
        assert_eq!(config.script_extensions, vec!["js", "jscad"]);
        assert_eq!(config.protocol, ProtocolVariant::Update);
        assert_eq!(config.single_file_name, "index.js");
        assert_eq!(config.root_segment, "root");
        assert_eq!(config.debounce_ms, 100);
        assert_eq!(config.log_level, LogLevel::Off);
    }

    #[test]
    fn test_save_then_load_from() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");
        let config = PreviewConfig {
            title_prefix: "Preview".to_string(),
            debounce_ms: 0,
            ..PreviewConfig::default()
        };
        config.save_to(&path).unwrap();
        assert!(!path.with_extension("yaml.tmp").exists());

        let loaded = PreviewConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_rejects_bad_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "script_extensions: {not: [a list\n").unwrap();
        assert!(matches!(
            PreviewConfig::load_from(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = PreviewConfig::load_from(&temp_dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_validate() {
        assert!(PreviewConfig::default().validate().is_ok());

        let config = PreviewConfig {
            script_extensions: vec![],
            ..PreviewConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let config = PreviewConfig {
            script_extensions: vec![".js".to_string()],
            ..PreviewConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PreviewConfig {
            root_segment: "a/b".to_string(),
            ..PreviewConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PreviewConfig {
            single_file_name: "index.ts".to_string(),
            ..PreviewConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_title_for_uses_final_segment() {
        let config = PreviewConfig::default();
        assert_eq!(
            config.title_for(Path::new("/work/models/gear.js")),
            "OpenJscad (gear.js)"
        );
        assert_eq!(
            config.title_for(Path::new("/work/models/")),
            "OpenJscad (models)"
        );
        assert_eq!(config.title_for(Path::new("/")), "OpenJscad (/)");
    }
}
