use std::fs;
use std::path::{Path, PathBuf};

use pagetree::{BTreeOptions, PageTreeError};
use serde::Deserialize;
use thiserror::Error;

use crate::ui::Theme;

/// Settings read from the optional TOML config file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub tree: BTreeOptions,
    pub ui: UiSection,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct UiSection {
    pub theme: Option<Theme>,
}

impl CliConfig {
    /// Loads `explicit` if given, else the per-user default file when it
    /// exists, else built-in defaults. An explicit path must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => read_file(path)?,
            None => match default_config_path().filter(|path| path.exists()) {
                Some(path) => read_file(&path)?,
                None => Self::default(),
            },
        };
        Ok(config)
    }
}

fn read_file(path: &Path) -> Result<CliConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: CliConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config
        .tree
        .validate()
        .map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), order = config.tree.order, "loaded CLI config");
    Ok(config)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read CLI config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid [tree] table in {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: PageTreeError,
    },
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("pagetree").join("config.toml"))
}
