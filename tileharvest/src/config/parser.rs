//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::defaults::MAX_WORKERS;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::MAX_ZOOM;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [harvest] section
    if let Some(section) = ini.section(Some("harvest")) {
        if let Some(v) = section.get("output_dir") {
            let v = v.trim();
            if !v.is_empty() {
                config.harvest.output_dir = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("zoom") {
            let zoom: u8 = parse_number("harvest", "zoom", v, "must be an integer")?;
            if zoom > MAX_ZOOM {
                return Err(invalid(
                    "harvest",
                    "zoom",
                    v,
                    &format!("must be between 0 and {}", MAX_ZOOM),
                ));
            }
            config.harvest.zoom = zoom;
        }
        if let Some(v) = section.get("workers") {
            let workers: usize =
                parse_number("harvest", "workers", v, "must be a positive integer")?;
            if workers == 0 || workers > MAX_WORKERS {
                return Err(invalid(
                    "harvest",
                    "workers",
                    v,
                    &format!("must be between 1 and {}", MAX_WORKERS),
                ));
            }
            config.harvest.workers = workers;
        }
        if let Some(v) = section.get("jpeg_quality") {
            let quality: u8 =
                parse_number("harvest", "jpeg_quality", v, "must be between 1 and 100")?;
            if !(1..=100).contains(&quality) {
                return Err(invalid(
                    "harvest",
                    "jpeg_quality",
                    v,
                    "must be between 1 and 100",
                ));
            }
            config.harvest.jpeg_quality = quality;
        }
        if let Some(v) = section.get("stop_on_persistence_error") {
            config.harvest.stop_on_persistence_error =
                parse_bool("harvest", "stop_on_persistence_error", v)?;
        }
    }

    // [provider] section
    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = section.get("base_url") {
            let v = v.trim();
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid(
                    "provider",
                    "base_url",
                    v,
                    "must start with http:// or https://",
                ));
            }
            config.provider.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = section.get("user_agent") {
            let v = v.trim();
            if !v.is_empty() {
                config.provider.user_agent = v.to_string();
            }
        }
        if let Some(v) = section.get("timeout") {
            let timeout: u64 = parse_number(
                "provider",
                "timeout",
                v,
                "must be a positive integer (seconds)",
            )?;
            if timeout == 0 {
                return Err(invalid(
                    "provider",
                    "timeout",
                    v,
                    "must be a positive integer (seconds)",
                ));
            }
            config.provider.timeout = timeout;
        }
    }

    // [input] section
    if let Some(section) = ini.section(Some("input")) {
        if let Some(v) = section.get("lat_column") {
            let v = v.trim();
            if !v.is_empty() {
                config.input.lat_column = v.to_string();
            }
        }
        if let Some(v) = section.get("lon_column") {
            let v = v.trim();
            if !v.is_empty() {
                config.input.lon_column = v.to_string();
            }
        }
        if let Some(v) = section.get("id_column") {
            let v = v.trim();
            config.input.id_column = if v.is_empty() {
                None
            } else {
                Some(v.to_string())
            };
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_harvest_section() {
        let config = parse(
            "[harvest]\noutput_dir = /tmp/out\nzoom = 18\nworkers = 8\njpeg_quality = 90\nstop_on_persistence_error = false\n",
        )
        .unwrap();

        assert_eq!(config.harvest.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.harvest.zoom, 18);
        assert_eq!(config.harvest.workers, 8);
        assert_eq!(config.harvest.jpeg_quality, 90);
        assert!(!config.harvest.stop_on_persistence_error);
    }

    #[test]
    fn test_provider_section_trims_trailing_slash() {
        let config = parse(
            "[provider]\nbase_url = https://tiles.example.com/imagery/\nuser_agent = Survey/2.0\ntimeout = 5\n",
        )
        .unwrap();

        assert_eq!(config.provider.base_url, "https://tiles.example.com/imagery");
        assert_eq!(config.provider.user_agent, "Survey/2.0");
        assert_eq!(config.provider.timeout, 5);
    }

    #[test]
    fn test_input_section() {
        let config =
            parse("[input]\nlat_column = latitude\nlon_column = longitude\nid_column = parcel\n")
                .unwrap();

        assert_eq!(config.input.lat_column, "latitude");
        assert_eq!(config.input.lon_column, "longitude");
        assert_eq!(config.input.id_column.as_deref(), Some("parcel"));
    }

    #[test]
    fn test_empty_id_column_means_row_index() {
        let config = parse("[input]\nid_column =\n").unwrap();
        assert!(config.input.id_column.is_none());
    }

    #[test]
    fn test_invalid_zoom() {
        let err = parse("[harvest]\nzoom = 24\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref section, ref key, .. }
                if section == "harvest" && key == "zoom"
        ));
    }

    #[test]
    fn test_invalid_workers() {
        assert!(parse("[harvest]\nworkers = 0\n").is_err());
        assert!(parse("[harvest]\nworkers = many\n").is_err());
    }

    #[test]
    fn test_invalid_quality() {
        assert!(parse("[harvest]\njpeg_quality = 0\n").is_err());
        assert!(parse("[harvest]\njpeg_quality = 101\n").is_err());
    }

    #[test]
    fn test_invalid_bool() {
        let err = parse("[harvest]\nstop_on_persistence_error = maybe\n").unwrap_err();
        assert!(err.to_string().contains("stop_on_persistence_error"));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(parse("[provider]\nbase_url = ftp://tiles\n").is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(parse("[provider]\ntimeout = 0\n").is_err());
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/out"), home.join("out"));
        }
        assert_eq!(expand_tilde("/abs/out"), PathBuf::from("/abs/out"));
    }
}
