use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::editor::TagPatterns;

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "tagtext";
const APPLICATION: &str = "tagtext";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Settings read from `config.toml`.
///
/// ```toml
/// [tags]
/// hashtags = true
/// mentions = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tags: TagPatterns,
}

pub fn config_file_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

pub fn parse_config(contents: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(contents)
}

/// Loads the configuration from `path`, or from the platform config
/// directory when no path is given. Missing or malformed files yield the
/// defaults.
pub fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        tracing::debug!(target: "tagtext::config", "no config directory available");
        return Config::default();
    };

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(target: "tagtext::config", path = %path.display(), "no config file");
            return Config::default();
        }
        Err(err) => {
            tracing::warn!(
                target: "tagtext::config",
                path = %path.display(),
                "failed to read config file: {err}"
            );
            return Config::default();
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            tracing::info!(target: "tagtext::config", path = %path.display(), ?config, "loaded config");
            config
        }
        Err(err) => {
            tracing::warn!(
                target: "tagtext::config",
                path = %path.display(),
                "failed to parse config file: {err}"
            );
            Config::default()
        }
    }
}
