#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Core value types for crime risk assessment.
//!
//! Every type here is request-scoped: built when a query arrives, handed
//! between the location resolver, the model adapters, and the risk
//! evaluator, then discarded after the response is rendered.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A WGS84 coordinate pair.
///
/// Can only be built through [`GeoPoint::new`], which enforces latitude in
/// `[-90, 90]` and longitude in `[-180, 180]`. Deserialization goes through
/// the same check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint", into = "RawGeoPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Creates a point after validating both coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinatesError`] if either value is non-finite or
    /// out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinatesError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinatesError {
                latitude,
                longitude,
            });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinatesError {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = InvalidCoordinatesError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl From<GeoPoint> for RawGeoPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }
}

/// Error returned when a coordinate pair is outside the WGS84 range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidCoordinatesError {
    /// The rejected latitude.
    pub latitude: f64,
    /// The rejected longitude.
    pub longitude: f64,
}

impl std::fmt::Display for InvalidCoordinatesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid coordinates ({}, {}): expected latitude in [-90, 90] and longitude in [-180, 180]",
            self.latitude, self.longitude
        )
    }
}

impl std::error::Error for InvalidCoordinatesError {}

/// Placeholder severity sent to the classifier (no live source exists).
pub const PLACEHOLDER_CRIME_SEVERITY: f64 = 3.0;
/// Placeholder air temperature in degrees Celsius.
pub const PLACEHOLDER_TEMPERATURE_C: f64 = 28.5;
/// Placeholder rainfall in millimetres.
pub const PLACEHOLDER_RAINFALL_MM: f64 = 0.0;
/// Placeholder traffic congestion level.
pub const PLACEHOLDER_TRAFFIC_LEVEL: f64 = 1.0;
/// Placeholder public complaint count.
pub const PLACEHOLDER_COMPLAINTS: f64 = 2.0;

/// Column names, in the order the crime type classifier was trained with.
pub const FEATURE_NAMES: [&str; FeatureVector::LEN] = [
    "Latitude",
    "Longitude",
    "Hour",
    "Crime_Severity",
    "Weather_Temperature_C",
    "Weather_Rainfall_mm",
    "Traffic_Congestion_Level",
    "Public_Complaints",
];

/// Input row for the crime type classifier.
///
/// Field order is a contract with the trained model and is not checked at
/// request time. Only location and hour come from the caller; the other
/// five fields are fixed placeholders until real-time context is wired in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    /// Query latitude.
    pub latitude: f64,
    /// Query longitude.
    pub longitude: f64,
    /// Hour of day (0-23).
    pub hour: f64,
    /// Crime severity (placeholder).
    pub crime_severity: f64,
    /// Temperature in Celsius (placeholder).
    pub temperature_c: f64,
    /// Rainfall in millimetres (placeholder).
    pub rainfall_mm: f64,
    /// Traffic congestion level (placeholder).
    pub traffic_level: f64,
    /// Public complaint count (placeholder).
    pub complaints: f64,
}

impl FeatureVector {
    /// Number of features the classifier expects.
    pub const LEN: usize = 8;

    /// Builds a vector from a location and hour, filling the remaining
    /// fields with the `PLACEHOLDER_*` constants.
    #[must_use]
    pub fn with_placeholders(point: GeoPoint, hour: u8) -> Self {
        Self {
            latitude: point.latitude(),
            longitude: point.longitude(),
            hour: f64::from(hour),
            crime_severity: PLACEHOLDER_CRIME_SEVERITY,
            temperature_c: PLACEHOLDER_TEMPERATURE_C,
            rainfall_mm: PLACEHOLDER_RAINFALL_MM,
            traffic_level: PLACEHOLDER_TRAFFIC_LEVEL,
            complaints: PLACEHOLDER_COMPLAINTS,
        }
    }

    /// Returns the features in training order (see [`FEATURE_NAMES`]).
    #[must_use]
    pub const fn to_array(&self) -> [f64; Self::LEN] {
        [
            self.latitude,
            self.longitude,
            self.hour,
            self.crime_severity,
            self.temperature_c,
            self.rainfall_mm,
            self.traffic_level,
            self.complaints,
        ]
    }
}

/// Crime type predicted by the classifier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrimeType {
    /// Physical attack or threat against a person
    Assault,
    /// Unlawful entry to commit theft or a felony
    Burglary,
    /// Deception for financial gain
    Fraud,
    /// Repeated unwanted conduct toward a person
    Harassment,
    /// Taking property without force
    Theft,
    /// The classifier returned a class id outside the label table
    Unknown,
}

impl CrimeType {
    /// Maps a classifier class id through the static label table.
    ///
    /// Ids outside `0..=4` map to [`CrimeType::Unknown`].
    #[must_use]
    pub const fn from_class_id(id: i64) -> Self {
        match id {
            0 => Self::Assault,
            1 => Self::Burglary,
            2 => Self::Fraud,
            3 => Self::Harassment,
            4 => Self::Theft,
            _ => Self::Unknown,
        }
    }

    /// Returns the class id for labelled types, `None` for `Unknown`.
    #[must_use]
    pub const fn class_id(self) -> Option<i64> {
        match self {
            Self::Assault => Some(0),
            Self::Burglary => Some(1),
            Self::Fraud => Some(2),
            Self::Harassment => Some(3),
            Self::Theft => Some(4),
            Self::Unknown => None,
        }
    }

    /// Whether the crime targets a person on the street, which warrants
    /// the stronger safety advisory.
    #[must_use]
    pub const fn is_personal_threat(self) -> bool {
        matches!(self, Self::Assault | Self::Theft | Self::Harassment)
    }

    /// Safety advice shown next to the prediction.
    #[must_use]
    pub const fn advisory(self) -> &'static str {
        if self.is_personal_threat() {
            "Caution: Avoid isolated areas and stay alert."
        } else {
            "Stay cautious and report suspicious activity."
        }
    }

    /// All labelled crime types in class id order (excludes `Unknown`).
    #[must_use]
    pub const fn labelled() -> &'static [Self] {
        &[
            Self::Assault,
            Self::Burglary,
            Self::Fraud,
            Self::Harassment,
            Self::Theft,
        ]
    }
}

/// Spatial risk derived from cluster membership.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpatialRisk {
    /// The point falls inside a cluster flagged as high risk.
    #[strum(serialize = "High Risk Zone")]
    HighRiskZone,
    /// Noise, or a cluster not flagged as high risk.
    #[strum(serialize = "Safe Zone")]
    SafeZone,
}

/// Temporal risk derived from the hour of day alone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemporalRisk {
    /// Late evening or night hours.
    #[strum(serialize = "High Risk Time")]
    HighRiskTime,
    /// Any other hour.
    #[strum(serialize = "Low Risk")]
    LowRisk,
}

/// Result of looking a point up against the historical clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClusterAssignment {
    /// Inside the eps-neighborhood of a core sample of this cluster.
    Cluster {
        /// Cluster id (0-based, as numbered at fit time).
        id: i32,
    },
    /// Not within reach of any core sample.
    Noise,
}

impl ClusterAssignment {
    /// Label value used for noise in fitted label arrays.
    pub const NOISE_LABEL: i32 = -1;

    /// Converts a raw DBSCAN label (`-1` for noise) into an assignment.
    #[must_use]
    pub const fn from_label(label: i32) -> Self {
        if label < 0 {
            Self::Noise
        } else {
            Self::Cluster { id: label }
        }
    }

    /// Returns the raw DBSCAN label (`-1` for noise).
    #[must_use]
    pub const fn label(self) -> i32 {
        match self {
            Self::Cluster { id } => id,
            Self::Noise => Self::NOISE_LABEL,
        }
    }
}

/// Spatial half of the risk evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialAssessment {
    /// Cluster the point was assigned to.
    pub assignment: ClusterAssignment,
    /// Risk label derived from the assignment.
    pub risk: SpatialRisk,
    /// Great-circle distance in metres to the nearest core sample.
    pub nearest_core_distance_m: Option<f64>,
}

/// A single-date crime count forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    /// Forecast date.
    pub date: NaiveDate,
    /// Point estimate truncated toward zero.
    pub predicted_count: i64,
    /// Lower edge of the uncertainty band.
    pub lower_bound: f64,
    /// Upper edge of the uncertainty band.
    pub upper_bound: f64,
}

/// Human-readable address breakdown from reverse geocoding.
///
/// Empty strings mean "unknown". The default value is the empty breakdown
/// returned when reverse geocoding fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInfo {
    /// Country name.
    pub country: String,
    /// State / province.
    pub state: String,
    /// District or county.
    pub district: String,
    /// Suburb, town, or city.
    pub locality: String,
}

impl AddressInfo {
    /// Whether every field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.country.is_empty()
            && self.state.is_empty()
            && self.district.is_empty()
            && self.locality.is_empty()
    }
}
