//! Layered configuration: site -> user -> project.
//!
//! [`LayeredConfig`] owns the site and user layers and resolves projects from
//! the user layer on demand. Front ends construct one at startup and pass it
//! by reference to whatever needs configuration.

use super::document::SaveOutcome;
use super::merge::{merge_layers, merge_services};
use super::paths::ConfigPaths;
use super::project::ProjectConfig;
use super::site::SiteConfig;
use super::user::{ProjectEntry, UserConfig};
use crate::error::Result;
use crate::types::{AppRecord, PluginRecord, ServiceRecord};

/// Outcome of [`LayeredConfig::save`] for each persisted layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayeredSaveReport {
    pub user: SaveOutcome,
    pub site: SaveOutcome,
}

#[derive(Debug, Clone)]
pub struct LayeredConfig {
    site: SiteConfig,
    user: UserConfig,
}

impl LayeredConfig {
    /// Load the site layer from `DEDAVERSE_SITE_CONFIG` and the user layer
    /// from the home directory.
    pub fn load() -> Result<Self> {
        Self::load_with(&ConfigPaths::from_env()?)
    }

    pub fn load_with(paths: &ConfigPaths) -> Result<Self> {
        let site = match SiteConfig::load_from(paths.site_config())? {
            Some(mut site) => {
                site.ensure_bootstrap_app();
                site
            }
            None => SiteConfig::bootstrap(),
        };
        let user = UserConfig::load_from(paths.user_config())?;
        Ok(Self::from_layers(site, user))
    }

    /// Assemble from already loaded layers.
    ///
    /// Layers built in memory rather than loaded have no location, so
    /// [`LayeredConfig::save`] skips them.
    pub fn from_layers(site: SiteConfig, user: UserConfig) -> Self {
        Self { site, user }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn site_mut(&mut self) -> &mut SiteConfig {
        &mut self.site
    }

    /// Whether a site layer is configured (and will be saved).
    pub fn site_present(&self) -> bool {
        self.site.is_present()
    }

    pub fn user(&self) -> &UserConfig {
        &self.user
    }

    pub fn user_mut(&mut self) -> &mut UserConfig {
        &mut self.user
    }

    /// The current project, resolving it from disk on first access.
    ///
    /// `None` when no current project is set or it has no user entry.
    pub fn current_project(&mut self) -> Result<Option<&ProjectConfig>> {
        let Some(name) = self.user.current_project.clone() else {
            return Ok(None);
        };
        if !self.user.contains_project(&name) {
            tracing::warn!(project = %name, "Current project is not in the user config");
            return Ok(None);
        }
        self.user.load_project(&name).map(Some)
    }

    /// Mutable access to the current project, resolving it first.
    pub fn current_project_mut(&mut self) -> Result<Option<&mut ProjectConfig>> {
        if self.current_project()?.is_none() {
            return Ok(None);
        }
        // Resolution may have re-keyed the entry; current_project follows it.
        let Some(name) = self.user.current_project.as_deref() else {
            return Ok(None);
        };
        Ok(self
            .user
            .projects
            .get_mut(name)
            .and_then(ProjectEntry::as_resolved_mut))
    }

    /// Make `project` current, adding it to the user layer if it is not there.
    pub fn set_current_project(&mut self, project: ProjectConfig) {
        let name = project.name.clone();
        if !self.user.contains_project(&name) {
            self.user.add_project(project);
        }
        tracing::info!(project = %name, "Setting current project");
        self.user.current_project = Some(name);
    }

    /// File a site-declared project into the user layer.
    ///
    /// Returns false when the site does not declare `name`. Existing user
    /// entries are left alone.
    pub fn adopt_site_project(&mut self, name: &str) -> bool {
        let Some(path) = self.site.projects.get(name) else {
            return false;
        };
        if !self.user.contains_project(name) {
            self.user.add_project_path(name, path.as_str());
        }
        true
    }

    /// Every project in the user layer, resolving unloaded entries.
    pub fn projects(&mut self) -> Result<impl Iterator<Item = &ProjectConfig>> {
        self.user.load_all_projects()?;
        Ok(self
            .user
            .projects
            .values()
            .filter_map(ProjectEntry::as_resolved))
    }

    pub fn get_project(&mut self, name: &str) -> Result<Option<&ProjectConfig>> {
        Ok(self.projects()?.find(|project| project.is_named(name)))
    }

    /// Apps from every layer, merged by name.
    pub fn get_merged_apps(&mut self) -> Result<Vec<AppRecord>> {
        let project_apps = self
            .current_project()?
            .map(|project| project.apps.clone())
            .unwrap_or_default();
        Ok(merge_layers([
            self.site.apps.as_slice(),
            self.user.apps.as_slice(),
            project_apps.as_slice(),
        ]))
    }

    /// Plugins from every layer, merged by name and version.
    pub fn get_merged_plugins(&mut self) -> Result<Vec<PluginRecord>> {
        let project_plugins = self
            .current_project()?
            .map(|project| project.plugins.clone())
            .unwrap_or_default();
        Ok(merge_layers([
            self.site.plugins.as_slice(),
            self.user.plugins.as_slice(),
            project_plugins.as_slice(),
        ]))
    }

    /// Site and user services; a site service cannot be redefined by the user.
    pub fn get_merged_services(&self) -> Vec<ServiceRecord> {
        merge_services([self.site.services.as_slice(), self.user.services.as_slice()])
    }

    /// Merged services the current project uses.
    ///
    /// A project that lists no services uses all of them.
    pub fn project_services(&mut self) -> Result<Vec<ServiceRecord>> {
        let wanted = self
            .current_project()?
            .map(|project| project.services.clone())
            .unwrap_or_default();
        let merged = self.get_merged_services();
        if wanted.is_empty() {
            return Ok(merged);
        }
        for name in &wanted {
            if !merged.iter().any(|service| &service.name == name) {
                tracing::warn!(service = %name, "Project uses a service no layer defines");
            }
        }
        Ok(merged
            .into_iter()
            .filter(|service| wanted.contains(&service.name))
            .collect())
    }

    /// Save the user layer, and the site layer when one is configured.
    pub fn save(&self) -> Result<LayeredSaveReport> {
        let user = self.user.save()?;
        let site = if self.site.is_present() {
            self.site.save()?
        } else {
            SaveOutcome::Skipped
        };
        Ok(LayeredSaveReport { user, site })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn paths(temp: &TempDir, with_site: bool) -> ConfigPaths {
        let site = with_site.then(|| temp.path().join("site").join("site.cfg"));
        ConfigPaths::new(site, temp.path().join("home").join(".dedaverse").join("user.cfg"))
    }

    #[test]
    fn absent_site_uses_bootstrap_layer() {
        let temp = TempDir::new().unwrap();
        let config = LayeredConfig::load_with(&paths(&temp, false)).unwrap();

        assert!(!config.site_present());
        assert_eq!(config.site().apps, vec![AppRecord::bootstrap()]);
    }

    #[test]
    fn empty_site_gets_bootstrap_app() {
        let temp = TempDir::new().unwrap();
        let config = LayeredConfig::load_with(&paths(&temp, true)).unwrap();

        assert!(config.site_present());
        assert_eq!(config.site().apps.len(), 1);
    }

    #[test]
    fn in_memory_layers_are_not_saved() {
        let mut config = LayeredConfig::from_layers(SiteConfig::bootstrap(), UserConfig::default());
        config.set_current_project(ProjectConfig::new("FEN", "/projects/fen"));

        let report = config.save().unwrap();
        assert_eq!(report.user, SaveOutcome::Skipped);
        assert_eq!(report.site, SaveOutcome::Skipped);
    }

    #[test]
    fn no_current_project_is_none() {
        let temp = TempDir::new().unwrap();
        let mut config = LayeredConfig::load_with(&paths(&temp, false)).unwrap();
        assert!(config.current_project().unwrap().is_none());

        config.user_mut().current_project = Some("Ghost".to_string());
        assert!(config.current_project().unwrap().is_none());
    }

    #[test]
    fn set_current_project_adds_missing_project() {
        let temp = TempDir::new().unwrap();
        let mut config = LayeredConfig::load_with(&paths(&temp, false)).unwrap();

        config.set_current_project(ProjectConfig::new("Foo", temp.path().join("foo")));

        assert!(config.user().contains_project("Foo"));
        assert_eq!(config.user().current_project.as_deref(), Some("Foo"));
        assert_eq!(config.current_project().unwrap().unwrap().name, "Foo");
    }

    #[test]
    fn set_current_project_keeps_existing_entry() {
        let temp = TempDir::new().unwrap();
        let mut config = LayeredConfig::load_with(&paths(&temp, false)).unwrap();
        config.user_mut().add_project_path("Foo", "/original/root");

        config.set_current_project(ProjectConfig::new("Foo", "/other/root"));

        assert_eq!(
            config.user().projects["Foo"].path(),
            Path::new("/original/root").to_path_buf()
        );
    }

    #[test]
    fn adopt_site_project_files_path_entry() {
        let temp = TempDir::new().unwrap();
        let mut config = LayeredConfig::load_with(&paths(&temp, false)).unwrap();
        config
            .site_mut()
            .projects
            .insert("FEN".to_string(), "/projects/fen".to_string());

        assert!(config.adopt_site_project("FEN"));
        assert!(!config.adopt_site_project("NOPE"));
        assert!(config.user().contains_project("FEN"));
        assert!(!config.user().projects["FEN"].is_resolved());
    }

    #[test]
    fn current_project_mut_edits_cached_project() {
        let temp = TempDir::new().unwrap();
        let mut config = LayeredConfig::load_with(&paths(&temp, false)).unwrap();
        config.set_current_project(ProjectConfig::new("Foo", temp.path().join("foo")));

        config.current_project_mut().unwrap().unwrap().key = Some("FOO".to_string());

        assert_eq!(
            config.current_project().unwrap().unwrap().key.as_deref(),
            Some("FOO")
        );
    }

    #[test]
    fn project_services_filters_by_project_names() {
        let temp = TempDir::new().unwrap();
        let mut config = LayeredConfig::load_with(&paths(&temp, false)).unwrap();
        config
            .site_mut()
            .services
            .push(ServiceRecord::new("perforce", "ssl:p4:1666"));
        config
            .user_mut()
            .services
            .push(ServiceRecord::new("jira", "https://jira.example.com"));

        assert_eq!(config.project_services().unwrap().len(), 2);

        let mut project = ProjectConfig::new("Foo", temp.path().join("foo"));
        project.services = vec!["jira".to_string()];
        config.set_current_project(project);

        let services = config.project_services().unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "jira");
    }

    #[test]
    fn save_skips_absent_site() {
        let temp = TempDir::new().unwrap();
        let config = LayeredConfig::load_with(&paths(&temp, false)).unwrap();

        let report = config.save().unwrap();

        assert!(report.user.is_written());
        assert_eq!(report.site, SaveOutcome::Skipped);
    }

    #[test]
    fn save_writes_present_site() {
        let temp = TempDir::new().unwrap();
        let config = LayeredConfig::load_with(&paths(&temp, true)).unwrap();

        let report = config.save().unwrap();

        assert!(report.site.is_written());
        assert!(temp.path().join("site").join("site.cfg").is_file());
    }
}
