//! Site configuration layer.
//!
//! The site layer is studio-wide and administrator controlled. Its location
//! comes from `DEDAVERSE_SITE_CONFIG`; when that is unset there is no site
//! layer at all, which is different from a configured but empty one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::document::{self, SaveOutcome};
use super::paths::site_config_path_from_env;
use crate::error::Result;
use crate::types::{AppRecord, PluginRecord, ServiceRecord, validate_optional_url};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Studio name (or user name for a one-person site)
    #[serde(default)]
    pub name: Option<String>,

    /// Plugin discovery and update URLs, in priority order
    #[serde(default)]
    pub plugin_urls: Vec<String>,

    #[serde(default)]
    pub plugins: Vec<PluginRecord>,

    #[serde(default)]
    pub services: Vec<ServiceRecord>,

    #[serde(default)]
    pub apps: Vec<AppRecord>,

    /// Studio-declared projects, name to root directory
    #[serde(default)]
    pub projects: BTreeMap<String, String>,

    #[serde(skip)]
    path: Option<PathBuf>,
}

impl SiteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stand-in used when no site layer exists: one bootstrap app, no location.
    pub fn bootstrap() -> Self {
        Self {
            apps: vec![AppRecord::bootstrap()],
            ..Self::default()
        }
    }

    /// Load the site layer named by `DEDAVERSE_SITE_CONFIG`.
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(site_config_path_from_env().as_deref())
    }

    /// Load the site layer from an explicit location.
    ///
    /// `None` means no site layer is configured. A configured path with no
    /// file yields an empty, present layer bound to that path.
    pub fn load_from(path: Option<&Path>) -> Result<Option<Self>> {
        let Some(path) = path else {
            tracing::debug!("No site config configured");
            return Ok(None);
        };

        let mut config = if path.is_file() {
            document::read_document::<SiteConfig>(path)?
        } else {
            tracing::info!(
                path = %path.display(),
                "Site config file not found, using an empty site layer"
            );
            SiteConfig::new()
        };
        config.path = Some(path.to_path_buf());
        Ok(Some(config))
    }

    /// Where this layer is persisted, if anywhere.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.path.is_some()
    }

    /// Add the bootstrap app when the layer has no apps.
    pub fn ensure_bootstrap_app(&mut self) {
        if self.apps.is_empty() {
            self.apps.push(AppRecord::bootstrap());
        }
    }

    /// Write the layer back to its location; a no-op without one.
    pub fn save(&self) -> Result<SaveOutcome> {
        let Some(path) = self.path.as_deref() else {
            return Ok(SaveOutcome::Skipped);
        };
        document::save_document(path, self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for url in &self.plugin_urls {
            if url.is_empty() {
                anyhow::bail!("Plugin URL cannot be empty");
            }
            validate_optional_url(url).context("Invalid site plugin_urls entry")?;
        }
        for plugin in &self.plugins {
            plugin.validate().context("Invalid site plugin")?;
        }
        for service in &self.services {
            service.validate().context("Invalid site service")?;
        }
        for app in &self.apps {
            app.validate().context("Invalid site app")?;
        }
        Ok(())
    }
}
