//! Configuration management CLI commands.
//!
//! Provides `config path`, `config list` and `config init` for inspecting
//! and creating the configuration file.

use clap::Subcommand;
use tileharvest::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// List the effective configuration settings
    List,

    /// Create the configuration file with defaults if it does not exist
    Init,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::List => run_list(),
        ConfigCommands::Init => run_init(),
    }
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

/// List all configuration settings.
fn run_list() -> Result<(), CliError> {
    let config = ConfigFile::load()?;

    println!("Configuration Settings");
    println!("======================");
    println!();

    for (section, entries) in settings_table(&config) {
        println!("[{}]", section);
        for (key, value) in entries {
            if value.is_empty() {
                println!("  {} = (not set)", key);
            } else {
                println!("  {} = {}", key, value);
            }
        }
        println!();
    }

    Ok(())
}

/// Create the default config file.
fn run_init() -> Result<(), CliError> {
    let path = config_file_path();

    if ConfigFile::create_default_at(&path)? {
        println!("Created configuration: {}", path.display());
    } else {
        println!("Configuration already exists: {}", path.display());
    }
    Ok(())
}

type Section = (&'static str, Vec<(&'static str, String)>);

fn settings_table(config: &ConfigFile) -> Vec<Section> {
    vec![
        (
            "harvest",
            vec![
                ("output_dir", config.harvest.output_dir.display().to_string()),
                ("zoom", config.harvest.zoom.to_string()),
                ("workers", config.harvest.workers.to_string()),
                ("jpeg_quality", config.harvest.jpeg_quality.to_string()),
                (
                    "stop_on_persistence_error",
                    config.harvest.stop_on_persistence_error.to_string(),
                ),
            ],
        ),
        (
            "provider",
            vec![
                ("base_url", config.provider.base_url.clone()),
                ("user_agent", config.provider.user_agent.clone()),
                ("timeout", config.provider.timeout.to_string()),
            ],
        ),
        (
            "input",
            vec![
                ("lat_column", config.input.lat_column.clone()),
                ("lon_column", config.input.lon_column.clone()),
                (
                    "id_column",
                    config.input.id_column.clone().unwrap_or_default(),
                ),
            ],
        ),
        (
            "logging",
            vec![("file", config.logging.file.display().to_string())],
        ),
    ]
}
