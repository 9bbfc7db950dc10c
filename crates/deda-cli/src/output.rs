//! Table and JSON rendering for CLI listings.

use anyhow::Result;
use clap::ValueEnum;

use deda_core::config::ProjectConfig;
use deda_core::types::{AppRecord, PluginRecord, ServiceRecord};

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

pub fn print_projects(
    projects: &[ProjectConfig],
    current: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => print!("{}", projects_table(projects, current)),
        OutputFormat::Json => {
            let output: Vec<_> = projects
                .iter()
                .map(|project| {
                    serde_json::json!({
                        "name": project.name,
                        "key": project.key,
                        "rootdir": project.rootdir,
                        "current": current == Some(project.name.as_str()),
                        "writable": project.is_writable(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn projects_table(projects: &[ProjectConfig], current: Option<&str>) -> String {
    if projects.is_empty() {
        return "No projects configured.\nCreate one with: deda start <name> <rootdir>\n"
            .to_string();
    }

    let mut out = format!("  {:<20} {:<8} {:<9} Root\n", "Name", "Key", "Writable");
    out.push_str(&format!("{}\n", "-".repeat(70)));
    for project in projects {
        let marker = if current == Some(project.name.as_str()) { "*" } else { " " };
        out.push_str(&format!(
            "{} {:<20} {:<8} {:<9} {}\n",
            marker,
            project.name,
            project.key.as_deref().unwrap_or("-"),
            if project.is_writable() { "yes" } else { "no" },
            project.rootdir.display()
        ));
    }
    out
}

pub fn print_project(project: &ProjectConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("Project: {}", project.name);
            if let Some(key) = &project.key {
                println!("Key: {}", key);
            }
            println!("Root: {}", project.rootdir.display());
            if let Some(path) = project.config_path() {
                println!("Config: {}", path.display());
            }
            if let Some(project_type) = &project.project_type {
                println!("Type: {}", project_type);
            }
            if !project.is_writable() {
                println!("  ⚠ Config file is read-only");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(project)?),
    }
    Ok(())
}

pub fn print_apps(apps: &[AppRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print!("{}", apps_table(apps)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(apps)?),
    }
    Ok(())
}

fn apps_table(apps: &[AppRecord]) -> String {
    let mut out = format!("{:<20} {:<10} {:<8} Command\n", "Name", "Version", "Enabled");
    out.push_str(&format!("{}\n", "-".repeat(70)));
    for app in apps {
        out.push_str(&format!(
            "{:<20} {:<10} {:<8} {}\n",
            app.name,
            app.version,
            if app.enabled { "yes" } else { "no" },
            app.command
        ));
    }
    out
}

pub fn print_plugins(plugins: &[PluginRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if plugins.is_empty() {
                println!("No plugins configured.");
                return Ok(());
            }
            println!("{:<20} {:<10} {:<8} {:<10}", "Name", "Version", "Enabled", "Installed");
            println!("{}", "-".repeat(70));
            for plugin in plugins {
                println!(
                    "{:<20} {:<10} {:<8} {:<10}",
                    plugin.name,
                    plugin.version,
                    if plugin.enabled { "yes" } else { "no" },
                    if plugin.installed { "yes" } else { "no" }
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(plugins)?),
    }
    Ok(())
}

pub fn print_services(services: &[ServiceRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if services.is_empty() {
                println!("No services configured.");
                return Ok(());
            }
            println!("{:<20} {:<8} Url", "Name", "Enabled");
            println!("{}", "-".repeat(70));
            for service in services {
                println!(
                    "{:<20} {:<8} {}",
                    service.name,
                    if service.enabled { "yes" } else { "no" },
                    service.url
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(services)?),
    }
    Ok(())
}
