//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - An explicit `--config` file
//! - Project files in the current directory (`.mapweave.yaml`, `.mapweave.json`)
//! - The user config directory
//! - Default values
//!
//! The mapping sections are folded into [`mapweave_core::Options`] before a
//! definition is compiled.

use crate::error::{Error, Result};
use mapweave_core::{Options, Value};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Named pipelines available to `$apply`
    pub pipelines: serde_json::Map<String, Json>,

    /// Dictionaries for the `map` transformer, as `[left, right]` pairs
    pub dictionaries: BTreeMap<String, Vec<(Json, Json)>>,

    /// Extra values treated as "no result"; undefined always is one
    pub nonvalues: Vec<Json>,

    /// Extra spellings for `$direction`
    pub directions: DirectionConfig,

    /// Skip undefined values and empty-list defaults everywhere
    pub no_defaults: bool,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Direction alias configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionConfig {
    /// Accepted in place of `fwd`
    pub forward: Option<String>,
    /// Accepted in place of `rev`
    pub reverse: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output by default
    pub color: bool,

    /// Show progress while mapping newline-delimited records
    pub progress: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (compact, full, json)
    pub format: String,

    /// Log file path
    pub file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            progress: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
            file: None,
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Project config file written by `config init`
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".mapweave.yaml")
    }

    /// User config file, if a config directory exists on this platform
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mapweave").join("config.yaml"))
    }

    /// Default configuration file paths to check, in order
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            Self::project_config_path(),
            PathBuf::from(".mapweave.yml"),
            PathBuf::from(".mapweave.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let mapweave_dir = config_dir.join("mapweave");
            paths.push(mapweave_dir.join("config.yaml"));
            paths.push(mapweave_dir.join("config.json"));
        }

        paths
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Compile options carrying the mapping sections of this config
    pub fn to_options(&self) -> Result<Options> {
        let mut options = Options::default().with_no_defaults(self.no_defaults);

        for (id, definition) in &self.pipelines {
            options = options.with_pipeline(id.clone(), definition.clone());
        }

        for (name, pairs) in &self.dictionaries {
            let dictionary = pairs
                .iter()
                .map(|(left, right)| (Value::from(left.clone()), Value::from(right.clone())))
                .collect();
            options = options.with_dictionary(name.clone(), dictionary);
        }

        let mut nonvalues = vec![Value::Undefined];
        nonvalues.extend(self.nonvalues.iter().cloned().map(Value::from));
        options = options.with_nonvalues(nonvalues);

        let DirectionConfig { forward, reverse } = &self.directions;
        for alias in [forward, reverse].into_iter().flatten() {
            if alias == "fwd" || alias == "rev" {
                return Err(Error::config(format!(
                    "direction alias '{}' shadows a built-in direction",
                    alias
                )));
            }
        }
        if forward.is_some() && forward == reverse {
            return Err(Error::config("forward and reverse aliases must differ"));
        }

        Ok(options.with_direction_aliases(forward.clone(), reverse.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_yaml_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
pipelines:
  user:
    name: fullName
dictionaries:
  status:
    - ["P", true]
    - ["D", false]
nonvalues: [null, ""]
directions:
  forward: to
  reverse: from
logging:
  level: debug
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.pipelines["user"], json!({ "name": "fullName" }));
        assert_eq!(config.dictionaries["status"].len(), 2);
        assert_eq!(config.nonvalues, vec![Json::Null, json!("")]);
        assert_eq!(config.directions.forward.as_deref(), Some("to"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "compact");
        assert!(config.output.color);
    }

    #[test]
    fn test_load_json_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "no_defaults": true, "output": { "progress": false } }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.no_defaults);
        assert!(!config.output.progress);
        assert!(config.output.color);
        assert!(config.pipelines.is_empty());
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = TempDir::new().unwrap();
        let err = Config::load_with_file(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.pipelines.insert("id".to_string(), json!("key"));
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.pipelines["id"], json!("key"));
    }

    #[test]
    fn test_to_options() {
        let mut config = Config::default();
        config.pipelines.insert("user".to_string(), json!({ "name": "fullName" }));
        config
            .dictionaries
            .insert("status".to_string(), vec![(json!("P"), json!(true))]);
        config.nonvalues = vec![Json::Null];
        config.directions.forward = Some("to".to_string());

        let options = config.to_options().unwrap();
        assert!(options.pipelines.contains_key("user"));
        assert_eq!(options.dictionaries["status"].len(), 1);
        assert_eq!(options.nonvalues, vec![Value::Undefined, Value::Null]);
        assert_eq!(options.fwd_alias.as_deref(), Some("to"));
        assert_eq!(options.rev_alias, None);
    }

    #[test]
    fn test_aliases_must_not_shadow_directions() {
        let mut config = Config::default();
        config.directions.forward = Some("rev".to_string());
        assert!(matches!(config.to_options(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.directions.forward = Some("up".to_string());
        config.directions.reverse = Some("up".to_string());
        assert!(matches!(config.to_options(), Err(Error::Config(_))));
    }
}
