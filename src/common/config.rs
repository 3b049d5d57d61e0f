use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::errors::PadmaError;

/// Global Padma configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// How category cleaning removes entries
    #[serde(default = "default_bulk_delete")]
    pub bulk_delete: DeletePolicy,

    /// How a single user-selected file is removed
    #[serde(default = "default_single_delete")]
    pub single_delete: DeletePolicy,

    /// How freed space is reported after a clean
    #[serde(default)]
    pub freed_space: FreedSpaceAccounting,

    /// Number of entries returned by the largest-files search
    #[serde(default = "default_largest_limit")]
    pub largest_files_limit: usize,

    /// Minimum size for the largest-files search, in MB
    #[serde(default = "default_large_file_mb")]
    pub large_file_threshold_mb: u64,

    /// Depth of the disk analysis tree
    #[serde(default = "default_analyze_depth")]
    pub analyze_depth: u32,

    /// Path substrings that are never deleted
    #[serde(default)]
    pub exclude_paths: Vec<String>,

    /// Output format preference
    #[serde(default)]
    pub output_format: OutputFormat,

    /// User-defined categories, merged over the built-in catalog
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryOverride>,
}

/// Whether removed entries are unlinked or moved to the recycle bin
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    Permanent,
    Trash,
}

/// `Verified` counts only bytes whose removal succeeded; `Optimistic`
/// reports the size discovered before the deletion pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FreedSpaceAccounting {
    #[default]
    Verified,
    Optimistic,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Quiet,
}

/// A category declared in config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryOverride {
    /// Root paths; `~`, `%VAR%` and `$VAR` are expanded, `*` is globbed
    pub roots: Vec<String>,

    #[serde(default = "default_category_depth")]
    pub max_depth: u32,
}

fn default_bulk_delete() -> DeletePolicy {
    DeletePolicy::Permanent
}
fn default_single_delete() -> DeletePolicy {
    DeletePolicy::Trash
}
fn default_largest_limit() -> usize {
    10
}
fn default_large_file_mb() -> u64 {
    50
}
fn default_analyze_depth() -> u32 {
    2
}
fn default_category_depth() -> u32 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bulk_delete: default_bulk_delete(),
            single_delete: default_single_delete(),
            freed_space: FreedSpaceAccounting::default(),
            largest_files_limit: default_largest_limit(),
            large_file_threshold_mb: default_large_file_mb(),
            analyze_depth: default_analyze_depth(),
            exclude_paths: Vec::new(),
            categories: BTreeMap::new(),
            output_format: OutputFormat::Human,
        }
    }
}

impl Config {
    /// Get the Padma data directory (~/.padma)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".padma")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Get the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }

    /// Load config from file, or fall back to defaults if it does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Config = toml::from_str(&contents).map_err(|e| PadmaError::Config {
                path: path.to_path_buf(),
                message: e.message().to_string(),
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Initialize all Padma directories
    pub fn init_dirs() -> Result<()> {
        for dir in [Self::data_dir(), Self::logs_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Get large file threshold in bytes
    pub fn large_file_threshold_bytes(&self) -> u64 {
        self.large_file_threshold_mb * 1024 * 1024
    }

    /// Check if a path should be excluded
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.display().to_string();
        self.exclude_paths.iter().any(|p| path_str.contains(p))
    }

    /// Apply a `config set <key> <value>` assignment
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "bulk_delete" => self.bulk_delete = parse_enum(value)?,
            "single_delete" => self.single_delete = parse_enum(value)?,
            "freed_space" => self.freed_space = parse_enum(value)?,
            "largest_files_limit" => self.largest_files_limit = value.parse()?,
            "large_file_threshold_mb" => self.large_file_threshold_mb = value.parse()?,
            "analyze_depth" => self.analyze_depth = value.parse()?,
            "output_format" => self.output_format = parse_enum(value)?,
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }
}

fn parse_enum<T: serde::de::DeserializeOwned>(value: &str) -> Result<T> {
    use serde::de::IntoDeserializer;
    let de: serde::de::value::StrDeserializer<'_, serde::de::value::Error> =
        value.into_deserializer();
    T::deserialize(de).map_err(|e| anyhow::anyhow!("Invalid value '{}': {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bulk_delete, DeletePolicy::Permanent);
        assert_eq!(config.single_delete, DeletePolicy::Trash);
        assert_eq!(config.freed_space, FreedSpaceAccounting::Verified);
        assert_eq!(config.largest_files_limit, 10);
        assert_eq!(config.large_file_threshold_bytes(), 50 * 1024 * 1024);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            single_delete = "permanent"

            [categories.downloads]
            roots = ["~/Downloads"]
            "#,
        )
        .unwrap();
        assert_eq!(config.single_delete, DeletePolicy::Permanent);
        assert_eq!(config.bulk_delete, DeletePolicy::Permanent);
        assert_eq!(config.categories["downloads"].max_depth, 5);
    }

    #[test]
    fn test_set_keys() {
        let mut config = Config::default();
        config.set("bulk_delete", "trash").unwrap();
        config.set("freed_space", "optimistic").unwrap();
        config.set("largest_files_limit", "20").unwrap();
        assert_eq!(config.bulk_delete, DeletePolicy::Trash);
        assert_eq!(config.freed_space, FreedSpaceAccounting::Optimistic);
        assert_eq!(config.largest_files_limit, 20);

        assert!(config.set("bulk_delete", "shred").is_err());
        assert!(config.set("no_such_key", "1").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut config = Config::default();
        config.exclude_paths.push("keep-me".into());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.exclude_paths, vec!["keep-me".to_string()]);
        assert!(loaded.is_excluded(Path::new("/tmp/keep-me/file.txt")));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "largest_files_limit = \"many\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<PadmaError>(), Some(PadmaError::Config { .. })));
    }
}
