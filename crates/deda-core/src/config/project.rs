//! Project configuration layer.
//!
//! A project is identified by its name alone. Two `ProjectConfig` values
//! with the same name but different roots describe the same project, so
//! comparisons go through [`ProjectKey`] or [`same_project`] rather than a
//! structural `PartialEq`.

use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::document::{self, SaveOutcome};
use super::paths::{project_config_path, resolve_project_config_path};
use crate::error::{ConfigError, Result};
use crate::types::{AppRecord, PluginRecord};

/// Identity of a project: its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectKey(String);

impl ProjectKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ProjectKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ProjectKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<String> for ProjectKey {
    fn eq(&self, other: &String) -> bool {
        &self.0 == other
    }
}

/// True when both values describe the same project (same name).
pub fn same_project(a: &ProjectConfig, b: &ProjectConfig) -> bool {
    a.name == b.name
}

/// The project configuration data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,

    /// Local root for all project files
    #[serde(default)]
    pub rootdir: PathBuf,

    /// Defaults to `{rootdir}/.dedaverse/project.cfg`
    #[serde(default)]
    pub cfg_path: Option<PathBuf>,

    /// Optional short name, e.g. "FEN"
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default, rename = "hdr_images_dir")]
    pub hdr_dir: Option<PathBuf>,

    #[serde(default)]
    pub lights_root: Option<PathBuf>,

    #[serde(default)]
    pub materials_root: Option<PathBuf>,

    /// Maps to the asset types offered when the project is created
    #[serde(default)]
    pub project_type: Option<String>,

    #[serde(default)]
    pub asset_types: Vec<String>,

    #[serde(default)]
    pub plugins: Vec<PluginRecord>,

    /// Names of the services this project uses
    #[serde(default)]
    pub services: Vec<String>,

    /// Project-pinned applications, shown in the Apps panel
    #[serde(default)]
    pub apps: Vec<AppRecord>,
}

impl ProjectConfig {
    /// A new project holding only the bootstrap app.
    pub fn new(name: impl Into<String>, rootdir: impl Into<PathBuf>) -> Self {
        Self::with_apps(name, rootdir, Vec::new())
    }

    /// A new project with the given apps; an empty list gets the bootstrap app.
    pub fn with_apps(
        name: impl Into<String>,
        rootdir: impl Into<PathBuf>,
        apps: Vec<AppRecord>,
    ) -> Self {
        let mut project = Self {
            name: name.into(),
            rootdir: rootdir.into(),
            cfg_path: None,
            key: None,
            hdr_dir: None,
            lights_root: None,
            materials_root: None,
            project_type: None,
            asset_types: Vec::new(),
            plugins: Vec::new(),
            services: Vec::new(),
            apps,
        };
        project.ensure_bootstrap_app();
        project
    }

    fn ensure_bootstrap_app(&mut self) {
        if self.apps.is_empty() {
            self.apps.push(AppRecord::bootstrap());
        }
    }

    pub fn project_key(&self) -> ProjectKey {
        ProjectKey::new(self.name.clone())
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }

    /// Load a project from its root directory or directly from its config file.
    ///
    /// Returns `Ok(None)` when there is no config file to load, or when the
    /// current user may not read it. A file that exists but cannot be parsed
    /// is an error.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if path.as_os_str().is_empty() {
            tracing::error!("Project must have a config path to load from");
            return Ok(None);
        }
        let cfg_path = resolve_project_config_path(path);
        if !cfg_path.is_file() {
            tracing::warn!(path = %cfg_path.display(), "Project config does not exist");
            return Ok(None);
        }

        let mut project: ProjectConfig = match document::read_document(&cfg_path) {
            Ok(project) => project,
            Err(ConfigError::ReadFile { path, source })
                if source.kind() == io::ErrorKind::PermissionDenied =>
            {
                tracing::warn!(path = %path.display(), "Project config is not readable");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        project.ensure_bootstrap_app();
        // Later saves go back to the file we read, however it was opened.
        project.cfg_path = Some(cfg_path);
        tracing::debug!(project = %project.name, "Loaded project config");
        Ok(Some(project))
    }

    /// The file this project saves to, if one can be determined.
    pub fn config_path(&self) -> Option<PathBuf> {
        match &self.cfg_path {
            Some(path) => Some(path.clone()),
            None if self.rootdir.as_os_str().is_empty() => None,
            None => Some(project_config_path(&self.rootdir)),
        }
    }

    /// True unless an existing config file denies the current user write access.
    pub fn is_writable(&self) -> bool {
        let Some(path) = self.cfg_path.as_deref() else {
            return true;
        };
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => {
                if meta.permissions().readonly() {
                    return false;
                }
                // Mode bits alone miss files owned by someone else.
                match OpenOptions::new().write(true).open(path) {
                    Ok(_) => true,
                    Err(err) => err.kind() != io::ErrorKind::PermissionDenied,
                }
            }
            _ => true,
        }
    }

    /// Persist the project to its config file.
    ///
    /// Read-only targets are skipped and file system failures are logged;
    /// both leave the in-memory project untouched.
    pub fn save(&mut self) -> Result<SaveOutcome> {
        let Some(path) = self.config_path() else {
            tracing::error!(
                project = %self.name,
                "Cannot save the project config because neither rootdir nor cfg_path is set"
            );
            return Err(ConfigError::MissingLocation(self.name.clone()));
        };
        self.cfg_path = Some(path.clone());

        if !self.is_writable() {
            tracing::warn!(project = %self.name, "Project config is read-only, not saving");
            return Ok(SaveOutcome::Skipped);
        }
        document::save_document(&path, self)
    }

    /// The path string stored for this project in the user layer.
    ///
    /// That is the root directory, unless the config file lives somewhere
    /// other than the default location under it.
    pub fn persisted_path(&self) -> PathBuf {
        match &self.cfg_path {
            Some(cfg) if self.rootdir.as_os_str().is_empty() => cfg.clone(),
            Some(cfg) if *cfg != project_config_path(&self.rootdir) => cfg.clone(),
            _ => self.rootdir.clone(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Project name cannot be empty");
        }
        for app in &self.apps {
            app.validate()
                .with_context(|| format!("Invalid app in project '{}'", self.name))?;
        }
        for plugin in &self.plugins {
            plugin
                .validate()
                .with_context(|| format!("Invalid plugin in project '{}'", self.name))?;
        }
        Ok(())
    }
}

impl fmt::Display for ProjectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn identity_is_by_name() {
        let foo_x = ProjectConfig::new("Foo", "/x");
        let foo_y = ProjectConfig::new("Foo", "/y");
        let bar = ProjectConfig::new("Bar", "/x");

        assert!(foo_x.project_key() == "Foo");
        assert!(foo_x.is_named("Foo"));
        assert!(same_project(&foo_x, &foo_y));
        assert_eq!(foo_x.project_key(), foo_y.project_key());
        assert!(!same_project(&foo_x, &bar));
    }

    #[test]
    fn new_project_gets_bootstrap_app() {
        let project = ProjectConfig::new("Foo", "/x");
        assert_eq!(project.apps.len(), 1);
        assert_eq!(project.apps[0], AppRecord::bootstrap());
    }

    #[test]
    fn explicit_apps_are_untouched() {
        let apps = vec![
            AppRecord::new("maya", "2024", "maya"),
            AppRecord::new("nuke", "15", "nuke"),
        ];
        let project = ProjectConfig::with_apps("Foo", "/x", apps.clone());
        assert_eq!(project.apps, apps);
    }

    #[test]
    fn config_path_defaults_under_rootdir() {
        let project = ProjectConfig::new("Foo", "/projects/foo");
        assert_eq!(
            project.config_path(),
            Some(PathBuf::from("/projects/foo/.dedaverse/project.cfg"))
        );

        let nowhere = ProjectConfig::new("Foo", "");
        assert_eq!(nowhere.config_path(), None);
    }

    #[test]
    fn load_from_directory_stamps_cfg_path() {
        let temp = TempDir::new().unwrap();
        let mut project = ProjectConfig::new("Foo", temp.path());
        project.save().unwrap();

        let loaded = ProjectConfig::load(temp.path()).unwrap().unwrap();
        assert_eq!(loaded.name, "Foo");
        assert_eq!(loaded.cfg_path, Some(project_config_path(temp.path())));
    }

    #[test]
    fn load_from_file_stamps_cfg_path() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("elsewhere.cfg");
        std::fs::write(&file, r#"{"name": "Foo", "rootdir": "/projects/foo"}"#).unwrap();

        let loaded = ProjectConfig::load(&file).unwrap().unwrap();
        assert_eq!(loaded.cfg_path.as_deref(), Some(file.as_path()));
        assert_eq!(loaded.rootdir, PathBuf::from("/projects/foo"));
        assert_eq!(loaded.apps.len(), 1);
    }

    #[test]
    fn load_missing_returns_none() {
        let temp = TempDir::new().unwrap();
        assert!(ProjectConfig::load(temp.path()).unwrap().is_none());
        assert!(ProjectConfig::load(Path::new("")).unwrap().is_none());
    }

    #[test]
    fn load_malformed_is_error() {
        let temp = TempDir::new().unwrap();
        let file = project_config_path(temp.path());
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, r#"{"rootdir": 5}"#).unwrap();

        assert!(ProjectConfig::load(temp.path()).is_err());
    }

    #[test]
    fn hdr_dir_uses_document_field_name() {
        let mut project = ProjectConfig::new("Foo", "/x");
        project.hdr_dir = Some(PathBuf::from("/x/hdr"));
        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["hdr_images_dir"], "/x/hdr");
        assert!(value.get("hdr_dir").is_none());
    }

    #[test]
    fn save_without_location_fails() {
        let mut project = ProjectConfig::new("Foo", "");
        let err = project.save().unwrap_err();
        assert!(matches!(err, ConfigError::MissingLocation(name) if name == "Foo"));
    }

    #[test]
    fn unsaved_project_is_writable() {
        let temp = TempDir::new().unwrap();
        let mut project = ProjectConfig::new("Foo", temp.path());
        assert!(project.is_writable());
        project.cfg_path = Some(temp.path().join("never-written.cfg"));
        assert!(project.is_writable());
    }

    #[test]
    fn persisted_path_prefers_rootdir() {
        let mut project = ProjectConfig::new("Foo", "/projects/foo");
        assert_eq!(project.persisted_path(), PathBuf::from("/projects/foo"));

        project.cfg_path = Some(project_config_path(Path::new("/projects/foo")));
        assert_eq!(project.persisted_path(), PathBuf::from("/projects/foo"));

        project.cfg_path = Some(PathBuf::from("/configs/foo.cfg"));
        assert_eq!(project.persisted_path(), PathBuf::from("/configs/foo.cfg"));
    }

    #[test]
    fn display_is_name() {
        assert_eq!(ProjectConfig::new("Foo", "/x").to_string(), "Foo");
    }
}
