// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Layers, later ones winning: built-in defaults, `tierlist.toml` (the
//! explicit `--config` file, or the one in the user config directory if it
//! exists), then `TIERLIST_*` environment variables.

use config::{Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ranking::DEFAULT_EXCLUDE_TAGS;

/// Config file name looked up in the user config directory
pub const CONFIG_FILE: &str = "tierlist.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer could not be read or does not match the schema
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for persistent data (picker handle cache)
    pub data_dir: PathBuf,
    /// Workspace directory used in host mode
    pub workspace_dir: PathBuf,
    /// Pick the workspace interactively instead of using `workspace_dir`
    pub picker: bool,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Species data JSON used by type and growth-rate filters
    pub species_data: Option<PathBuf>,
    /// Tags excluded from rankings by default
    pub exclude_tags: Vec<String>,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "hyperpolymath", "tierlist")
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("~/.local/share/tierlist"));
        Self {
            workspace_dir: data_dir.join("workspace"),
            data_dir,
            picker: false,
            log_level: "info".to_string(),
            species_data: None,
            exclude_tags: DEFAULT_EXCLUDE_TAGS.iter().map(|t| (*t).to_string()).collect(),
        }
    }
}

/// Default location of the config file
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join(CONFIG_FILE))
}

/// Load configuration; `path` overrides the default file and must exist
///
/// # Errors
///
/// Fails on unreadable or malformed layers.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder =
        config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

    match path {
        Some(path) => {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        None => {
            if let Some(path) = default_path() {
                builder =
                    builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
            }
        }
    }

    let layered = builder
        .add_source(
            Environment::with_prefix("TIERLIST")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("exclude_tags"),
        )
        .build()?;

    Ok(layered.try_deserialize()?)
}
