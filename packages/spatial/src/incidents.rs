//! Historical incident CSV loading.
//!
//! Only the coordinate columns are read. Headers are trimmed and matched
//! case-insensitively (`Latitude`/`lat` and `Longitude`/`lon`/`lng`); when
//! several headers match, the leftmost wins. Every other column is
//! ignored. Rows with missing, unparseable, or out-of-range coordinates
//! are skipped.

use std::io::Read;
use std::path::Path;

use crime_insight_risk_models::GeoPoint;

use crate::SpatialError;

/// Header names accepted for the latitude column (lowercase).
const LATITUDE_HEADERS: &[&str] = &["latitude", "lat"];
/// Header names accepted for the longitude column (lowercase).
const LONGITUDE_HEADERS: &[&str] = &["longitude", "lon", "lng"];

/// Reads incident coordinates from a CSV file.
///
/// # Errors
///
/// Returns [`SpatialError::Io`] if the file cannot be opened,
/// [`SpatialError::Csv`] if the header row cannot be read, and
/// [`SpatialError::MissingColumn`] if no latitude or longitude column is
/// present.
pub fn read_incidents_csv(path: &Path) -> Result<Vec<GeoPoint>, SpatialError> {
    let file = std::fs::File::open(path)?;
    let points = read_incidents(file)?;
    log::info!("Read {} incident coordinates from {}", points.len(), path.display());
    Ok(points)
}

/// Reads incident coordinates from any CSV source.
///
/// # Errors
///
/// Returns [`SpatialError::Csv`] if the header row cannot be read and
/// [`SpatialError::MissingColumn`] if no latitude or longitude column is
/// present.
pub fn read_incidents(reader: impl Read) -> Result<Vec<GeoPoint>, SpatialError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    let lat_idx = column_index(&headers, LATITUDE_HEADERS, "latitude")?;
    let lon_idx = column_index(&headers, LONGITUDE_HEADERS, "longitude")?;
    log::debug!(
        "Using columns '{}' and '{}' for coordinates",
        headers[lat_idx],
        headers[lon_idx]
    );

    let mut points = Vec::new();
    let mut skipped = 0u64;

    for result in csv_reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                log::trace!("  skipping malformed row: {e}");
                skipped += 1;
                continue;
            }
        };

        let field = |idx: usize| {
            record
                .get(idx)
                .map(str::trim)
                .and_then(|s| s.parse::<f64>().ok())
        };

        match (field(lat_idx), field(lon_idx)) {
            (Some(lat), Some(lon)) => match GeoPoint::new(lat, lon) {
                Ok(point) => points.push(point),
                Err(e) => {
                    log::trace!("  skipping row: {e}");
                    skipped += 1;
                }
            },
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} incident rows without valid coordinates");
    }

    Ok(points)
}

/// Index of the leftmost header matching one of `names`.
fn column_index(headers: &[String], names: &[&str], column: &str) -> Result<usize, SpatialError> {
    headers
        .iter()
        .position(|h| names.iter().any(|name| h.eq_ignore_ascii_case(name)))
        .ok_or_else(|| SpatialError::MissingColumn {
            message: format!("no {column} column (expected one of {names:?}, found {headers:?})"),
        })
}
