//! Tile command - show which tile a coordinate maps to.

use tileharvest::config::{ConfigFile, HarvestConfig};
use tileharvest::coord::{to_tile_coords, tile_to_lat_lon};
use tileharvest::provider::{create_provider, AsyncProvider};

use crate::error::CliError;

/// Arguments for the tile command.
pub struct TileArgs {
    pub lat: f64,
    pub lon: f64,
    pub zoom: Option<u8>,
    pub base_url: Option<String>,
}

/// Run the tile command.
pub fn run(args: TileArgs) -> Result<(), CliError> {
    let file = ConfigFile::load()?;
    let mut config = HarvestConfig::from_config_file(&file);
    if let Some(zoom) = args.zoom {
        config = config.with_zoom(zoom);
    }
    if let Some(url) = &args.base_url {
        config = config.with_base_url(url);
    }

    let tile = to_tile_coords(args.lat, args.lon, config.zoom())?;
    let provider = create_provider(&config)?;
    let (north, west) = tile_to_lat_lon(&tile);

    println!("Location:  {}, {}", args.lat, args.lon);
    println!("Zoom:      {}", tile.zoom);
    println!("Tile:      x={}, y={}", tile.x, tile.y);
    println!("NW corner: {:.6}, {:.6}", north, west);
    println!("URL:       {}", provider.tile_url(&tile));

    Ok(())
}
