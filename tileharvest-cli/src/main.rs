//! tileharvest CLI - Command-line interface
//!
//! This binary provides a command-line interface to the tileharvest library.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::config::ConfigCommands;
use commands::harvest::HarvestArgs;
use commands::tile::TileArgs;

#[derive(Debug, Parser)]
#[command(name = "tileharvest")]
#[command(version = tileharvest::VERSION)]
#[command(about = "Harvest satellite imagery tiles for a list of coordinates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download one tile per CSV row into the output directory
    Harvest {
        /// CSV file with a header row and latitude/longitude columns
        #[arg(long, short)]
        input: PathBuf,

        /// Directory tiles are written to
        #[arg(long, short)]
        output_dir: Option<PathBuf>,

        /// Zoom level used for every row (0-23)
        #[arg(long, short)]
        zoom: Option<u8>,

        /// Rows harvested concurrently
        #[arg(long, short)]
        workers: Option<usize>,

        /// Per-request timeout in seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,

        /// Tile endpoint; requests go to <base-url>/<zoom>/<y>/<x>
        #[arg(long)]
        base_url: Option<String>,

        /// User-Agent sent with every request
        #[arg(long)]
        user_agent: Option<String>,

        /// JPEG quality of written tiles (1-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
        jpeg_quality: Option<u8>,

        /// Latitude column name
        #[arg(long)]
        lat_column: Option<String>,

        /// Longitude column name
        #[arg(long)]
        lon_column: Option<String>,

        /// Column naming each output file (default: row index)
        #[arg(long)]
        id_column: Option<String>,

        /// Keep starting new rows after a local write failure
        #[arg(long)]
        keep_going: bool,

        /// Also print log lines to stdout
        #[arg(long, short)]
        verbose: bool,

        /// Enable debug-level logging
        #[arg(long)]
        debug: bool,
    },

    /// Print the tile address and URL for one coordinate
    Tile {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Zoom level (default: from config, else 19)
        #[arg(long, short)]
        zoom: Option<u8>,

        /// Tile endpoint (default: from config)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Harvest {
            input,
            output_dir,
            zoom,
            workers,
            timeout,
            base_url,
            user_agent,
            jpeg_quality,
            lat_column,
            lon_column,
            id_column,
            keep_going,
            verbose,
            debug,
        } => {
            commands::harvest::run(HarvestArgs {
                input,
                output_dir,
                zoom,
                workers,
                timeout,
                base_url,
                user_agent,
                jpeg_quality,
                lat_column,
                lon_column,
                id_column,
                keep_going,
                verbose,
                debug,
            })
            .await
        }
        Commands::Tile {
            lat,
            lon,
            zoom,
            base_url,
        } => commands::tile::run(TileArgs {
            lat,
            lon,
            zoom,
            base_url,
        }),
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
