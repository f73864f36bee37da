//! # Config Loader
//!
//! Loads the optional `config.toml` that provides defaults for the command
//! line options. Every field is optional; values given on the command line
//! take precedence (see `cli::handlers::commons::RunSettings`).
//!
//! ```toml
//! instruction-prefix = "%"
//! missing-file-handling = "include"
//! normalize-paths = true
//! preprocessor = "cpp -P"
//! ```

use crate::core::{paths, rendition::MissingFileMode, tags::SetOperator};
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::{fs, path::Path};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileListConfig {
    pub instruction_prefix: Option<String>,
    pub missing_file_handling: Option<MissingFileMode>,
    #[serde(default)]
    pub relative_file_argument_location: bool,
    #[serde(default)]
    pub normalize_paths: bool,
    #[serde(default)]
    pub absolute_paths: bool,
    pub stdin_paths_are_relative: Option<String>,
    #[serde(default)]
    pub suppress_non_path_output: bool,
    #[serde(default)]
    pub prepend_tags: bool,
    #[serde(default)]
    pub append_tags: bool,
    pub filter_tags: Option<String>,
    #[serde(default, deserialize_with = "deserialize_operator")]
    pub operator_for_filter_tags: Option<SetOperator>,
    #[serde(default)]
    pub negate_operator_for_filter_tags: bool,
    #[serde(default)]
    pub forward_tags: bool,
    pub preprocessor: Option<String>,
}

/// Operators are looked up by name or alias, as on the command line.
fn deserialize_operator<'de, D>(deserializer: D) -> Result<Option<SetOperator>, D::Error>
where
    D: Deserializer<'de>,
{
    let name: Option<String> = Option::deserialize(deserializer)?;
    name.map(|name| name.parse().map_err(serde::de::Error::custom))
        .transpose()
}

impl FileListConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Loads the settings file, or the empty configuration if there is none.
pub fn load(explicit: Option<&Path>) -> Result<FileListConfig> {
    let Some(path) = paths::find_config_file(explicit)? else {
        log::debug!("No settings file found, using defaults.");
        return Ok(FileListConfig::default());
    };

    log::debug!("Loading settings from '{}'", path.display());
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read settings file '{}'", path.display()))?;
    FileListConfig::from_toml(&content)
        .with_context(|| format!("Failed to parse settings file '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_is_all_defaults() {
        let config = FileListConfig::from_toml("").unwrap();
        assert_eq!(config, FileListConfig::default());
    }

    #[test]
    fn test_full_config() {
        let config = FileListConfig::from_toml(
            r#"
            instruction-prefix = "%"
            missing-file-handling = "only"
            normalize-paths = true
            filter-tags = "a, b"
            operator-for-filter-tags = "none-of"
            preprocessor = "cpp -P"
            "#,
        )
        .unwrap();

        assert_eq!(config.instruction_prefix.as_deref(), Some("%"));
        assert_eq!(config.missing_file_handling, Some(MissingFileMode::Only));
        assert!(config.normalize_paths);
        assert!(!config.absolute_paths);
        assert_eq!(config.filter_tags.as_deref(), Some("a, b"));
        assert_eq!(config.operator_for_filter_tags, Some(SetOperator::ContainsNoneOf));
        assert_eq!(config.preprocessor.as_deref(), Some("cpp -P"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(FileListConfig::from_toml("operator-for-filter-tags = \"bogus\"").is_err());
        assert!(FileListConfig::from_toml("missing-file-handling = \"sometimes\"").is_err());
        assert!(FileListConfig::from_toml("no-such-option = true").is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "forward-tags = true\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert!(config.forward_tags);
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read settings file"));
    }
}
