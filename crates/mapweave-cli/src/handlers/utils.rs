//! Shared utilities for command handlers

use crate::config::Config;
use crate::error::{Error, Result};
use mapweave_core::{MapTransform, Options};
use serde_json::Value as Json;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Whether a path names a YAML file
pub fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false)
}

/// Read a file, or stdin when no path is given
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            Ok(fs::read_to_string(path)?)
        }
        None => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}

/// Parse JSON or YAML content; YAML is chosen by the file extension
pub fn parse_document(content: &str, path: Option<&Path>) -> Result<Json> {
    let display = path.unwrap_or_else(|| Path::new("<stdin>"));
    if path.map(is_yaml).unwrap_or(false) {
        serde_yaml::from_str(content).map_err(|_| Error::InvalidFormat {
            path: display.to_path_buf(),
            expected: "YAML".to_string(),
        })
    } else {
        serde_json::from_str(content).map_err(|_| Error::InvalidFormat {
            path: display.to_path_buf(),
            expected: "JSON".to_string(),
        })
    }
}

/// Read and parse a JSON or YAML file
pub fn read_document(path: &Path) -> Result<Json> {
    let content = read_input(Some(path))?;
    debug!(path = %path.display(), bytes = content.len(), "read document");
    parse_document(&content, Some(path))
}

/// Write a document as YAML or pretty JSON, by extension
pub fn write_document(path: &Path, value: &Json) -> Result<()> {
    let content = if is_yaml(path) {
        serde_yaml::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Options from the config, plus named pipelines from an extra file
pub fn load_options(config: &Config, pipelines: Option<&Path>) -> Result<Options> {
    let mut options = config.to_options()?;

    if let Some(path) = pipelines {
        let Json::Object(extra) = read_document(path)? else {
            return Err(Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "an object of named pipelines".to_string(),
            });
        };
        debug!(count = extra.len(), "loaded named pipelines");
        for (id, definition) in extra {
            options = options.with_pipeline(id, definition);
        }
    }

    Ok(options)
}

/// Read and compile a mapping definition
pub fn compile_definition(path: &Path, options: Options) -> Result<MapTransform> {
    let definition = read_document(path)?;
    Ok(MapTransform::new(&definition, options)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_read_yaml_and_json_documents() {
        let dir = TempDir::new().unwrap();

        let yaml = dir.path().join("mapping.yaml");
        fs::write(&yaml, "title: headline\ntags: meta.keywords[]\n").unwrap();
        assert_eq!(
            read_document(&yaml).unwrap(),
            json!({ "title": "headline", "tags": "meta.keywords[]" })
        );

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ nope").unwrap();
        assert!(matches!(
            read_document(&broken),
            Err(Error::InvalidFormat { .. })
        ));

        assert!(matches!(
            read_document(&dir.path().join("absent.json")),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_write_document_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("result.yaml");
        write_document(&path, &json!({ "a": [1] })).unwrap();
        assert_eq!(read_document(&path).unwrap(), json!({ "a": [1] }));
    }

    #[test]
    fn test_load_options_with_pipelines_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipelines.json");
        fs::write(&path, r#"{ "user": { "name": "fullName" } }"#).unwrap();

        let options = load_options(&Config::default(), Some(&path)).unwrap();
        assert!(options.pipelines.contains_key("user"));

        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            load_options(&Config::default(), Some(&path)),
            Err(Error::InvalidFormat { .. })
        ));
    }
}
