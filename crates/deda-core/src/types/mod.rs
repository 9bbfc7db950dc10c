//! Record types shared by every configuration layer.
//!
//! Records carry identity-based equality: two apps with the same name are
//! the same app regardless of version, plugins are identified by name and
//! version, and services by name. Layer merging relies on these identities.

use std::hash::{Hash, Hasher};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Name of the bootstrap viewer app present in every merged app list.
pub const BOOTSTRAP_APP_NAME: &str = "Viewer";

/// Command used to launch the bootstrap viewer.
pub const BOOTSTRAP_APP_COMMAND: &str = "deda-viewer";

/// Identity used when merging records across layers.
pub trait MergeKey {
    type Key: Eq + Hash + Clone;

    fn merge_key(&self) -> Self::Key;
}

/// An installable application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppRecord {
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub command: String,

    #[serde(default)]
    pub icon_path: String,

    #[serde(default)]
    pub install_url: String,

    #[serde(default)]
    pub help_url: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl AppRecord {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            command: command.into(),
            icon_path: String::new(),
            install_url: String::new(),
            help_url: String::new(),
            enabled: true,
        }
    }

    /// The always-present viewer launcher.
    pub fn bootstrap() -> Self {
        Self::new(BOOTSTRAP_APP_NAME, "1.0", BOOTSTRAP_APP_COMMAND)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("App name cannot be empty");
        }
        validate_optional_url(&self.install_url)
            .with_context(|| format!("Invalid install_url for app '{}'", self.name))?;
        validate_optional_url(&self.help_url)
            .with_context(|| format!("Invalid help_url for app '{}'", self.name))?;
        Ok(())
    }
}

impl PartialEq for AppRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for AppRecord {}

impl Hash for AppRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl MergeKey for AppRecord {
    type Key = String;

    fn merge_key(&self) -> String {
        self.name.clone()
    }
}

/// A versioned plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRecord {
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub installed: bool,

    #[serde(default)]
    pub url: String,
}

impl PluginRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            enabled: true,
            installed: false,
            url: String::new(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Plugin name cannot be empty");
        }
        validate_optional_url(&self.url)
            .with_context(|| format!("Invalid url for plugin '{}@{}'", self.name, self.version))?;
        Ok(())
    }
}

impl PartialEq for PluginRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Eq for PluginRecord {}

impl Hash for PluginRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
    }
}

impl MergeKey for PluginRecord {
    type Key = (String, String);

    fn merge_key(&self) -> (String, String) {
        (self.name.clone(), self.version.clone())
    }
}

/// A parameterized REST service.
///
/// Identified by name only, so a layer cannot redefine a service that an
/// earlier layer already declared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub name: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub params: Vec<String>,
}

impl ServiceRecord {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            url: url.into(),
            params: Vec::new(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Service name cannot be empty");
        }
        validate_optional_url(&self.url)
            .with_context(|| format!("Invalid url for service '{}'", self.name))?;
        Ok(())
    }
}

impl PartialEq for ServiceRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ServiceRecord {}

impl Hash for ServiceRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl MergeKey for ServiceRecord {
    type Key = String;

    fn merge_key(&self) -> String {
        self.name.clone()
    }
}

/// Empty strings are allowed; anything else must be an absolute URL.
pub(crate) fn validate_optional_url(value: &str) -> anyhow::Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    url::Url::parse(value).with_context(|| format!("'{}' is not a valid URL", value))?;
    Ok(())
}
