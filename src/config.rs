use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Optional config file, looked up in the working directory.
pub const CONFIG_FILE: &str = ".termtasks.json";

/// Overrides `data_file` when set.
pub const DATA_FILE_ENV: &str = "TERMTASKS_DATA_FILE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Task file read at start and written on save.
    pub data_file: PathBuf,
    /// Log output; the terminal itself belongs to the UI.
    pub log_file: PathBuf,
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("tasks.json"),
            log_file: PathBuf::from("termtasks.log"),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Reads `path`, falling back to defaults when it does not exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Config file from the working directory, then the environment override.
    pub fn load() -> Result<Self> {
        let config = Self::from_file(Path::new(CONFIG_FILE))?;
        Ok(config.with_env_override(std::env::var(DATA_FILE_ENV).ok()))
    }

    fn with_env_override(mut self, data_file: Option<String>) -> Self {
        if let Some(path) = data_file.filter(|p| !p.trim().is_empty()) {
            self.data_file = PathBuf::from(path);
        }
        self
    }
}
