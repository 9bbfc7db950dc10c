//! Configuration management for the three layers
//!
//! - Site: studio-wide, located by `DEDAVERSE_SITE_CONFIG`
//! - User: `~/.dedaverse/user.cfg`
//! - Project: `{rootdir}/.dedaverse/project.cfg`

pub mod document;
pub mod layered;
pub mod merge;
pub mod paths;
pub mod project;
pub mod site;
pub mod user;

pub use document::SaveOutcome;
pub use layered::{LayeredConfig, LayeredSaveReport};
pub use merge::{merge_layers, merge_services};
pub use paths::{ConfigPaths, SITE_CONFIG_ENV, project_config_path};
pub use project::{ProjectConfig, ProjectKey, same_project};
pub use site::SiteConfig;
pub use user::{ProjectEntry, Reindex, Resolution, UserConfig, resolve_entry};
