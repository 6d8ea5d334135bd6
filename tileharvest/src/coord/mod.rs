//! Coordinate conversion module
//!
//! Converts geographic coordinates (latitude/longitude) into Web Mercator
//! tile addresses used by slippy-map imagery services.

mod types;


pub use types::{
    CoordError, Coordinate, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MERCATOR_MAX_LAT, MIN_LAT,
    MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to tile coordinates.
///
/// Uses the slippy-map projection:
///
/// - `x = floor((lon + 180) / 360 * 2^zoom)`
/// - `y = floor((1 - ln(tan(lat) + sec(lat)) / π) / 2 * 2^zoom)`
///
/// # Arguments
///
/// * `lat` - Latitude in degrees, strictly between -90.0 and 90.0
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 23)
///
/// # Returns
///
/// The tile containing the point. The poles are rejected with
/// [`CoordError::InvalidLatitude`] because `tan` and `sec` diverge there.
/// Latitudes past the Mercator limit (±85.0511°) and `lon = 180` saturate to
/// the last valid row/column, so the result always satisfies
/// `0 <= x, y < 2^zoom`.
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !lat.is_finite() || lat <= MIN_LAT || lat >= MAX_LAT {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !lon.is_finite() || !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let max_index = (1u32 << zoom) - 1;

    let x = ((lon + 180.0) / 360.0 * n).floor();

    let lat_rad = lat * PI / 180.0;
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();

    Ok(TileCoord {
        x: saturate(x, max_index),
        y: saturate(y, max_index),
        zoom,
    })
}

/// Converts a [`Coordinate`] to tile coordinates at the given zoom.
#[inline]
pub fn coordinate_to_tile(coordinate: &Coordinate, zoom: u8) -> Result<TileCoord, CoordError> {
    to_tile_coords(coordinate.lat(), coordinate.lon(), zoom)
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

// Index values are floored already; this only pins the out-of-grid cases.
#[inline]
fn saturate(index: f64, max_index: u32) -> u32 {
    if index <= 0.0 {
        0
    } else if index >= max_index as f64 {
        max_index
    } else {
        index as u32
    }
}
