//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let id_column = config.input.id_column.as_deref().unwrap_or("");

    format!(
        r#"[harvest]
; Directory harvested tiles are written to, one file per item:
;   <output_dir>/tile_id_<identifier>.jpg
; An existing file is never downloaded again.
output_dir = {}
; Slippy-map zoom level used for every item (0-23, default: 19)
zoom = {}
; Items harvested concurrently (default: 1 = one request at a time)
workers = {}
; JPEG quality of written tiles (1-100, default: 95)
jpeg_quality = {}
; Stop starting new items after a local write failure such as a full disk
stop_on_persistence_error = {}

[provider]
; Tile endpoint. Requests go to <base_url>/<zoom>/<y>/<x>
base_url = {}
; User-Agent sent with every request
user_agent = {}
; Per-request timeout in seconds (default: 12)
timeout = {}

[input]
; CSV column holding latitudes
lat_column = {}
; CSV column holding longitudes
lon_column = {}
; CSV column naming each output file. If empty, the data row index is used.
id_column = {}

[logging]
; Log file path
file = {}
"#,
        path_to_string(&config.harvest.output_dir),
        config.harvest.zoom,
        config.harvest.workers,
        config.harvest.jpeg_quality,
        config.harvest.stop_on_persistence_error,
        config.provider.base_url,
        config.provider.user_agent,
        config.provider.timeout,
        config.input.lat_column,
        config.input.lon_column,
        id_column,
        path_to_string(&config.logging.file),
    )
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
