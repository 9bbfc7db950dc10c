//! User configuration layer.
//!
//! The user layer maps project names to projects. An entry starts out as the
//! path read from `user.cfg` and is resolved into a [`ProjectConfig`] the
//! first time it is needed. On disk an entry is always a path string.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::document::{self, SaveOutcome};
use super::paths::user_config_path;
use super::project::ProjectConfig;
use crate::error::{ConfigError, Result};
use crate::types::{AppRecord, PluginRecord, ServiceRecord};

/// A project in the user layer, either still a path or already loaded.
#[derive(Debug, Clone)]
pub enum ProjectEntry {
    Unresolved(PathBuf),
    Resolved(ProjectConfig),
}

impl ProjectEntry {
    /// The path stored on disk for this entry.
    pub fn path(&self) -> PathBuf {
        match self {
            Self::Unresolved(path) => path.clone(),
            Self::Resolved(project) => project.persisted_path(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn as_resolved(&self) -> Option<&ProjectConfig> {
        match self {
            Self::Resolved(project) => Some(project),
            Self::Unresolved(_) => None,
        }
    }

    pub fn as_resolved_mut(&mut self) -> Option<&mut ProjectConfig> {
        match self {
            Self::Resolved(project) => Some(project),
            Self::Unresolved(_) => None,
        }
    }
}

impl Serialize for ProjectEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.path().serialize(serializer)
    }
}

/// Entries as found on disk. Older files may hold whole project documents.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Path(PathBuf),
    Document {
        #[serde(default)]
        rootdir: PathBuf,
        #[serde(default)]
        cfg_path: Option<PathBuf>,
    },
}

impl<'de> Deserialize<'de> for ProjectEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let path = match StoredEntry::deserialize(deserializer)? {
            StoredEntry::Path(path) => path,
            StoredEntry::Document { rootdir, cfg_path } => match cfg_path {
                Some(cfg) if rootdir.as_os_str().is_empty() => cfg,
                _ => rootdir,
            },
        };
        Ok(Self::Unresolved(path))
    }
}

/// A key change required because a project's name on disk differs from the
/// name it was filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reindex {
    pub old_key: String,
    pub new_key: String,
}

/// A resolved entry, plus the re-keying the caller must apply.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub project: ProjectConfig,
    pub reindex: Option<Reindex>,
}

/// Resolve the path filed under `key` into a project.
///
/// A missing config file yields a fresh project named `key` rooted at
/// `path`. A malformed one is an error.
pub fn resolve_entry(key: &str, path: &Path) -> Result<Resolution> {
    let project = match ProjectConfig::load(path)? {
        Some(project) => project,
        None => {
            tracing::info!(
                project = key,
                path = %path.display(),
                "Creating project from user config entry"
            );
            ProjectConfig::new(key, path)
        }
    };
    let reindex = (project.name != key).then(|| Reindex {
        old_key: key.to_string(),
        new_key: project.name.clone(),
    });
    Ok(Resolution { project, reindex })
}

/// The user configuration data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub current_project: Option<String>,

    #[serde(default)]
    pub projects: BTreeMap<String, ProjectEntry>,

    /// Artist roles: animator, rigger, concept artist, ...
    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub plugins: Vec<PluginRecord>,

    #[serde(default)]
    pub services: Vec<ServiceRecord>,

    #[serde(default)]
    pub apps: Vec<AppRecord>,

    #[serde(skip)]
    path: PathBuf,
}

impl UserConfig {
    /// Load `~/.dedaverse/user.cfg`.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Self::load_from(&user_config_path(&home))
    }

    /// Load from an explicit location; a missing file yields an empty layer.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.is_file() {
            document::read_document::<UserConfig>(path)?
        } else {
            tracing::info!(path = %path.display(), "User config not found, starting empty");
            UserConfig::default()
        };
        config.path = path.to_path_buf();
        Ok(config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace the entry for this project.
    pub fn add_project(&mut self, project: ProjectConfig) {
        tracing::debug!(project = %project.name, "Adding project to user config");
        self.projects
            .insert(project.name.clone(), ProjectEntry::Resolved(project));
    }

    /// Insert or replace an entry that will be resolved on first use.
    pub fn add_project_path(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.projects
            .insert(name.into(), ProjectEntry::Unresolved(path.into()));
    }

    pub fn contains_project(&self, name: &str) -> bool {
        self.projects.contains_key(name)
    }

    /// Resolve the entry filed under `name`, loading it from disk if needed.
    ///
    /// When the loaded project carries a different name, the entry moves to
    /// that name and `current_project` follows it.
    pub fn load_project(&mut self, name: &str) -> Result<&ProjectConfig> {
        let entry = self
            .projects
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProject(name.to_string()))?;
        let key = match entry {
            ProjectEntry::Resolved(_) => name.to_string(),
            ProjectEntry::Unresolved(path) => {
                let resolution = resolve_entry(name, path)?;
                self.apply_resolution(name, resolution)
            }
        };
        self.projects
            .get(&key)
            .and_then(ProjectEntry::as_resolved)
            .ok_or(ConfigError::UnknownProject(key))
    }

    /// Store a resolved entry, applying any re-keying. Returns the final key.
    pub fn apply_resolution(&mut self, key: &str, resolution: Resolution) -> String {
        let Resolution { project, reindex } = resolution;
        let Some(Reindex { old_key, new_key }) = reindex else {
            self.projects
                .insert(key.to_string(), ProjectEntry::Resolved(project));
            return key.to_string();
        };

        tracing::info!(
            old = %old_key,
            new = %new_key,
            "Project was renamed on disk, updating user config"
        );
        self.projects.remove(&old_key);
        if self.projects.contains_key(&new_key) {
            tracing::warn!(project = %new_key, "Renamed project replaces an existing entry");
        }
        self.projects
            .insert(new_key.clone(), ProjectEntry::Resolved(project));
        if self.current_project.as_deref() == Some(old_key.as_str()) {
            self.current_project = Some(new_key.clone());
        }
        new_key
    }

    /// Resolve every entry that is still a path.
    pub fn load_all_projects(&mut self) -> Result<()> {
        let pending: Vec<String> = self
            .projects
            .iter()
            .filter(|(_, entry)| !entry.is_resolved())
            .map(|(name, _)| name.clone())
            .collect();
        for name in pending {
            // An earlier rename may have replaced this key already.
            if self.contains_project(&name) {
                self.load_project(&name)?;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for app in &self.apps {
            app.validate().context("Invalid user app")?;
        }
        for plugin in &self.plugins {
            plugin.validate().context("Invalid user plugin")?;
        }
        for service in &self.services {
            service.validate().context("Invalid user service")?;
        }
        Ok(())
    }

    /// Write the layer to its location with every project flattened to a path.
    ///
    /// A layer not obtained from [`UserConfig::load_from`] has no location
    /// and is not written.
    pub fn save(&self) -> Result<SaveOutcome> {
        if self.path.as_os_str().is_empty() {
            tracing::debug!("User config has no location, not saving");
            return Ok(SaveOutcome::Skipped);
        }
        document::save_document(&self.path, self)
    }
}
