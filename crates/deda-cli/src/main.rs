//! Dedaverse - pipeline launcher configuration
//!
//! Usage:
//!   deda projects              # List projects in the user config
//!   deda current               # Show the current project
//!   deda use <name>            # Select the current project
//!   deda start <name> <root>   # Create a project and select it
//!   deda apps                  # Show merged apps

mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deda_core::config::paths::site_config_path_from_env;
use deda_core::config::{
    ConfigPaths, LayeredConfig, LayeredSaveReport, ProjectConfig, SaveOutcome,
};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "deda")]
#[command(about = "Dedaverse pipeline configuration", long_about = None)]
struct Cli {
    /// User config file (defaults to ~/.dedaverse/user.cfg)
    #[arg(long, global = true)]
    user_config: Option<PathBuf>,

    /// Site config file (defaults to $DEDAVERSE_SITE_CONFIG)
    #[arg(long, global = true)]
    site_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects known to the user config
    Projects {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the current project
    Current {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Select the current project
    ///
    /// Projects declared only by the site config are added to the user
    /// config when selected.
    Use {
        /// Project name
        name: String,
    },

    /// Create a project, save it, and make it current
    Start {
        /// Project name
        name: String,
        /// Project root directory
        rootdir: PathBuf,
        /// Short project key, e.g. FEN
        #[arg(long)]
        key: Option<String>,
        /// Project type, used to pick initial asset types
        #[arg(long)]
        project_type: Option<String>,
    },

    /// Show apps merged across site, user and project
    Apps {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show plugins merged across site, user and project
    Plugins {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the services the current project uses
    Services {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Validate the site, user and current project configs
    Check,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deda=info,deda_core=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let paths = resolve_paths(&cli)?;
    let mut config = LayeredConfig::load_with(&paths).context("Failed to load configuration")?;

    run_cli(&mut config, cli.command)
}

fn resolve_paths(cli: &Cli) -> Result<ConfigPaths> {
    let mut paths = match &cli.user_config {
        Some(user) => ConfigPaths::new(site_config_path_from_env(), user.clone()),
        None => ConfigPaths::from_env().context("Could not resolve config locations")?,
    };
    if let Some(site) = &cli.site_config {
        paths = paths.with_site_config(Some(site.clone()));
    }
    Ok(paths)
}

fn run_cli(config: &mut LayeredConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Projects { format } => run_projects(config, format),
        Commands::Current { format } => run_current(config, format),
        Commands::Use { name } => run_use(config, &name),
        Commands::Start {
            name,
            rootdir,
            key,
            project_type,
        } => run_start(config, name, rootdir, key, project_type),
        Commands::Apps { format } => {
            let apps = config.get_merged_apps()?;
            output::print_apps(&apps, format)
        }
        Commands::Plugins { format } => {
            let plugins = config.get_merged_plugins()?;
            output::print_plugins(&plugins, format)
        }
        Commands::Services { format } => {
            let services = config.project_services()?;
            output::print_services(&services, format)
        }
        Commands::Check => run_check(config),
    }
}

fn run_projects(config: &mut LayeredConfig, format: OutputFormat) -> Result<()> {
    let current = config.user().current_project.clone();
    let projects: Vec<ProjectConfig> = config.projects()?.cloned().collect();
    output::print_projects(&projects, current.as_deref(), format)
}

fn run_current(config: &mut LayeredConfig, format: OutputFormat) -> Result<()> {
    // A broken project file should not take the launcher down with it.
    match config.current_project() {
        Ok(Some(project)) => output::print_project(project, format),
        Ok(None) => {
            println!("No project selected.");
            println!("Select one with: deda use <name>");
            Ok(())
        }
        Err(err) => {
            tracing::error!("Failed to load the current project: {err}");
            println!("No project selected.");
            Ok(())
        }
    }
}

fn run_use(config: &mut LayeredConfig, name: &str) -> Result<()> {
    if !config.user().contains_project(name) && !config.adopt_site_project(name) {
        anyhow::bail!("Unknown project '{}'. Create it with: deda start {} <rootdir>", name, name);
    }
    // The name on disk wins if the project was renamed elsewhere.
    let project = config.user_mut().load_project(name)?.clone();
    let current = project.name.clone();
    config.set_current_project(project);
    report_save(&config.save()?);
    println!("✓ Current project is now '{}'", current);
    Ok(())
}

fn run_start(
    config: &mut LayeredConfig,
    name: String,
    rootdir: PathBuf,
    key: Option<String>,
    project_type: Option<String>,
) -> Result<()> {
    if config.user().contains_project(&name) {
        anyhow::bail!("Project '{}' already exists", name);
    }
    let mut project = ProjectConfig::new(name, rootdir);
    project.key = key;
    project.project_type = project_type;

    match project.save()? {
        SaveOutcome::Written(path) => println!("✓ Created project config {}", path.display()),
        SaveOutcome::Skipped => println!("  ⚠ Project config is read-only, not written"),
        SaveOutcome::Failed(path) => println!("  ⚠ Could not write {}", path.display()),
    }

    let name = project.name.clone();
    config.set_current_project(project);
    report_save(&config.save()?);
    println!("✓ Current project is now '{}'", name);
    Ok(())
}

fn run_check(config: &mut LayeredConfig) -> Result<()> {
    config.site().validate().context("Site config is invalid")?;
    config.user().validate().context("User config is invalid")?;
    if let Some(project) = config.current_project()? {
        project.validate().context("Current project is invalid")?;
    }
    println!("✓ Configuration is valid");
    Ok(())
}

fn report_save(report: &LayeredSaveReport) {
    if let SaveOutcome::Failed(path) = &report.user {
        println!("  ⚠ Could not write user config {}", path.display());
    }
    if let SaveOutcome::Failed(path) = &report.site {
        println!("  ⚠ Could not write site config {}", path.display());
    }
}
