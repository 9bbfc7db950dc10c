//! Config path resolution helpers.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Environment variable naming the site config file.
pub const SITE_CONFIG_ENV: &str = "DEDAVERSE_SITE_CONFIG";

/// Directory holding dedaverse metadata, under a home or project root.
pub const CONFIG_DIR_NAME: &str = ".dedaverse";

pub const USER_CONFIG_FILE: &str = "user.cfg";

pub const PROJECT_CONFIG_FILE: &str = "project.cfg";

/// Locations of the site and user layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    site_config: Option<PathBuf>,
    user_config: PathBuf,
}

impl ConfigPaths {
    /// Resolve locations from `DEDAVERSE_SITE_CONFIG` and the home directory.
    pub fn from_env() -> Result<Self> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(Self {
            site_config: site_config_path_from_env(),
            user_config: user_config_path(&home),
        })
    }

    /// Create with explicit locations (for tools and tests).
    pub fn new(site_config: Option<PathBuf>, user_config: PathBuf) -> Self {
        Self {
            site_config,
            user_config,
        }
    }

    pub fn with_site_config(mut self, site_config: Option<PathBuf>) -> Self {
        self.site_config = site_config;
        self
    }

    pub fn with_user_config(mut self, user_config: PathBuf) -> Self {
        self.user_config = user_config;
        self
    }

    pub fn site_config(&self) -> Option<&Path> {
        self.site_config.as_deref()
    }

    pub fn user_config(&self) -> &Path {
        &self.user_config
    }
}

/// The site config path, if the environment variable is set and non-empty.
pub fn site_config_path_from_env() -> Option<PathBuf> {
    std::env::var_os(SITE_CONFIG_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub fn user_config_path(home: &Path) -> PathBuf {
    home.join(CONFIG_DIR_NAME).join(USER_CONFIG_FILE)
}

/// Default config file for a project root.
pub fn project_config_path(rootdir: &Path) -> PathBuf {
    rootdir.join(CONFIG_DIR_NAME).join(PROJECT_CONFIG_FILE)
}

/// A directory resolves to its project config file; anything else is taken
/// as the file itself.
pub fn resolve_project_config_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        project_config_path(path)
    } else {
        path.to_path_buf()
    }
}
