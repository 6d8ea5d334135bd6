//! CSV batch input.
//!
//! Reads coordinates from a CSV file with a header row and validates each
//! row into a [`HarvestRequest`]. Rows that cannot be harvested are
//! collected as [`RejectedRow`]s instead of failing the whole file, so a
//! few bad lines never block a large batch.
//!
//! ```text
//! lat,long
//! 40.7128,-74.0060
//! 51.5074,-0.1278
//! ```
//!
//! Without an identifier column each row is named by its zero-based data
//! row index, which keeps names stable when some rows are rejected.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{InputSettings, DEFAULT_LAT_COLUMN, DEFAULT_LON_COLUMN};
use crate::coord::Coordinate;
use crate::harvest::{HarvestRequest, Identifier};

/// Errors that prevent reading the input at all.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot open input {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("cannot read input: {0}")]
    Read(#[from] csv::Error),

    #[error("input has no '{0}' column")]
    MissingColumn(String),
}

/// Names of the columns holding each field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputColumns {
    pub lat: String,
    pub lon: String,
    /// Identifier column; the row index is used when `None`
    pub id: Option<String>,
}

impl Default for InputColumns {
    fn default() -> Self {
        Self {
            lat: DEFAULT_LAT_COLUMN.to_string(),
            lon: DEFAULT_LON_COLUMN.to_string(),
            id: None,
        }
    }
}

impl From<&InputSettings> for InputColumns {
    fn from(settings: &InputSettings) -> Self {
        Self {
            lat: settings.lat_column.clone(),
            lon: settings.lon_column.clone(),
            id: settings.id_column.clone(),
        }
    }
}

/// A data row that will not be harvested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// Zero-based data row index (header excluded)
    pub row: usize,
    pub reason: String,
}

/// Validated requests plus the rows that were turned away.
#[derive(Debug, Default)]
pub struct InputBatch {
    pub requests: Vec<HarvestRequest>,
    pub rejected: Vec<RejectedRow>,
}

/// Reads and validates a CSV file.
pub fn read_requests(path: &Path, columns: &InputColumns) -> Result<InputBatch, InputError> {
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let batch = read_requests_from(file, columns)?;

    debug!(
        path = %path.display(),
        accepted = batch.requests.len(),
        rejected = batch.rejected.len(),
        "Input read"
    );
    Ok(batch)
}

/// Reads and validates CSV data from any reader.
pub fn read_requests_from<R: io::Read>(
    reader: R,
    columns: &InputColumns,
) -> Result<InputBatch, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| InputError::MissingColumn(name.to_string()))
    };
    let lat_idx = position(&columns.lat)?;
    let lon_idx = position(&columns.lon)?;
    let id_idx = columns.id.as_deref().map(position).transpose()?;

    let mut batch = InputBatch::default();
    for (row, record) in reader.records().enumerate() {
        // Only I/O failures end the read; a malformed record is one bad row.
        let parsed = match record {
            Ok(record) => parse_row(&record, row, lat_idx, lon_idx, id_idx),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => Err(e.to_string()),
        };
        match parsed {
            Ok(request) => batch.requests.push(request),
            Err(reason) => {
                warn!(row, reason = %reason, "Skipping input row");
                batch.rejected.push(RejectedRow { row, reason });
            }
        }
    }

    Ok(batch)
}

fn parse_row(
    record: &csv::StringRecord,
    row: usize,
    lat_idx: usize,
    lon_idx: usize,
    id_idx: Option<usize>,
) -> Result<HarvestRequest, String> {
    let lat = parse_field(record, lat_idx, "latitude")?;
    let lon = parse_field(record, lon_idx, "longitude")?;
    let coordinate = Coordinate::new(lat, lon).map_err(|e| e.to_string())?;

    let identifier = match id_idx {
        Some(idx) => {
            let value = record.get(idx).unwrap_or("");
            Identifier::new(value).map_err(|e| e.to_string())?
        }
        None => Identifier::from_index(row),
    };

    Ok(HarvestRequest::new(coordinate, identifier))
}

fn parse_field(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let value = record.get(idx).unwrap_or("");
    if value.is_empty() {
        return Err(format!("missing {}", name));
    }
    value
        .parse::<f64>()
        .map_err(|_| format!("{} '{}' is not a number", name, value))
}
