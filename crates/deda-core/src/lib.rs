//! Dedaverse Core Library
//!
//! Layered configuration for the dedaverse pipeline launcher: studio-wide
//! site settings, per-user settings, and per-project settings resolved
//! lazily from disk.

pub mod config;
pub mod error;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{
        ConfigPaths, LayeredConfig, ProjectConfig, ProjectEntry, ProjectKey, SaveOutcome,
        SiteConfig, UserConfig, same_project,
    };

    // Errors
    pub use crate::error::ConfigError;

    // Records
    pub use crate::types::{AppRecord, PluginRecord, ServiceRecord};
}
