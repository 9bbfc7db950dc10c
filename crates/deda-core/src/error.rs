//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for loading and saving configuration layers.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not a valid document.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to serialize a config document.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failed to write a config file.
    #[error("failed to write config file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a config directory.
    #[error("failed to create config directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A project has neither a `cfg_path` nor a `rootdir` to save to.
    #[error("project '{0}' has neither a cfg_path nor a rootdir to save to")]
    MissingLocation(String),

    /// The user config has no entry for the requested project.
    #[error("project '{0}' is not in the user config")]
    UnknownProject(String),

    /// The home directory could not be determined.
    #[error("could not determine the home directory")]
    NoHomeDir,
}

impl ConfigError {
    /// Creates a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse error.
    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Creates a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the file system refusing a write.
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::WriteFile { .. } | Self::CreateDir { .. })
    }
}

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
