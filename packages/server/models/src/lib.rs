#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime insight server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the assessment types so the API contract can evolve independently,
//! and so per-model failures can be rendered as data instead of errors.

use chrono::NaiveDate;
use crime_insight_assessment::AssessmentResult;
use crime_insight_risk_models::{
    AddressInfo, CrimeType, ForecastPoint, GeoPoint, SpatialAssessment, SpatialRisk, TemporalRisk,
};
use serde::{Deserialize, Serialize};

/// Outcome of one model-backed part of a response.
///
/// Serialized as `{"status":"ok","value":…}` or
/// `{"status":"failed","error":"…"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ApiOutcome<T> {
    /// The model produced a value.
    Ok {
        /// The value.
        value: T,
    },
    /// The model failed for this request.
    Failed {
        /// User-visible error message.
        error: String,
    },
}

impl<T> ApiOutcome<T> {
    /// Converts a result, mapping the success value into its API shape.
    pub fn from_result<U, E: std::fmt::Display>(
        result: Result<U, E>,
        map: impl FnOnce(U) -> T,
    ) -> Self {
        match result {
            Ok(value) => Self::Ok { value: map(value) },
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// A crime type the classifier can predict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCrimeType {
    /// Classifier class id.
    pub id: i64,
    /// Machine-readable code (e.g. `"ASSAULT"`).
    pub code: CrimeType,
    /// Display name.
    pub name: String,
    /// Safety advice for this crime type.
    pub advisory: String,
}

/// A crime type prediction for a location and hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCrimeTypePrediction {
    /// Machine-readable code (`"UNKNOWN"` for unlabelled class ids).
    pub code: CrimeType,
    /// Display name.
    pub name: String,
    /// Safety advice for this crime type.
    pub advisory: String,
}

impl From<CrimeType> for ApiCrimeTypePrediction {
    fn from(crime_type: CrimeType) -> Self {
        Self {
            code: crime_type,
            name: crime_type.to_string(),
            advisory: crime_type.advisory().to_string(),
        }
    }
}

/// Risk zone membership of a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSpatialRisk {
    /// Machine-readable risk level.
    pub risk: SpatialRisk,
    /// Display label (e.g. `"High Risk Zone"`).
    pub label: String,
    /// Cluster id, or `None` for noise.
    pub cluster: Option<i32>,
    /// Distance to the nearest historical hotspot core, in metres.
    pub nearest_core_distance_m: Option<f64>,
}

impl From<SpatialAssessment> for ApiSpatialRisk {
    fn from(assessment: SpatialAssessment) -> Self {
        let label = assessment.assignment.label();
        Self {
            risk: assessment.risk,
            label: assessment.risk.to_string(),
            cluster: (label >= 0).then_some(label),
            nearest_core_distance_m: assessment.nearest_core_distance_m,
        }
    }
}

/// Risk derived from the hour of day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTemporalRisk {
    /// Hour of day (0-23).
    pub hour: u8,
    /// Machine-readable risk level.
    pub risk: TemporalRisk,
    /// Display label (e.g. `"High Risk Time"`).
    pub label: String,
}

impl ApiTemporalRisk {
    /// Builds the response for an hour and its computed risk.
    #[must_use]
    pub fn new(hour: u8, risk: TemporalRisk) -> Self {
        Self {
            hour,
            risk,
            label: risk.to_string(),
        }
    }
}

/// A resolved location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLocation {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Reverse geocoded address (fields empty when unknown).
    pub address: AddressInfo,
}

impl ApiLocation {
    /// Builds the response from a resolved point and its address.
    #[must_use]
    pub const fn new(point: GeoPoint, address: AddressInfo) -> Self {
        Self {
            latitude: point.latitude(),
            longitude: point.longitude(),
            address,
        }
    }
}

/// Full assessment response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAssessment {
    /// Request id, also present in the server logs.
    pub request_id: String,
    /// Resolved location.
    pub location: ApiLocation,
    /// Most likely crime type.
    pub crime_type: ApiOutcome<ApiCrimeTypePrediction>,
    /// Risk zone membership.
    pub spatial_risk: ApiOutcome<ApiSpatialRisk>,
    /// Risk from the hour of day.
    pub temporal_risk: ApiTemporalRisk,
    /// Crime count forecast.
    pub forecast: ApiOutcome<ForecastPoint>,
}

impl ApiAssessment {
    /// Converts an assessment result into its API shape.
    #[must_use]
    pub fn new(request_id: String, result: AssessmentResult) -> Self {
        Self {
            request_id,
            location: ApiLocation::new(result.point, result.address),
            crime_type: ApiOutcome::from_result(result.crime_type, ApiCrimeTypePrediction::from),
            spatial_risk: ApiOutcome::from_result(result.spatial_risk, ApiSpatialRisk::from),
            temporal_risk: ApiTemporalRisk::new(result.hour, result.temporal_risk),
            forecast: ApiOutcome::from_result(result.forecast, |point| point),
        }
    }
}

/// Query parameters for the temporal risk endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalRiskParams {
    /// Hour of day (0-23).
    pub hour: Option<i64>,
}

/// Query parameters for the forecast endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastParams {
    /// Forecast date. Defaults to tomorrow.
    pub date: Option<NaiveDate>,
}

/// Hint telling the client to ask for coordinates instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualCoordinatesHint {
    /// Message to show the user.
    pub message: String,
    /// Request fields to fill in.
    pub fields: Vec<String>,
}

impl Default for ManualCoordinatesHint {
    fn default() -> Self {
        Self {
            message: "Location not found. Enter latitude and longitude manually.".to_string(),
            fields: vec!["latitude".to_string(), "longitude".to_string()],
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// User-visible error message.
    pub error: String,
    /// Request id, when the request was assigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Present when the client should fall back to manual coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_coordinates: Option<ManualCoordinatesHint>,
}

impl ApiError {
    /// An error with only a message.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            request_id: None,
            manual_coordinates: None,
        }
    }

    /// Attaches a request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attaches the manual coordinates fallback hint.
    #[must_use]
    pub fn with_manual_coordinates(mut self) -> Self {
        self.manual_coordinates = Some(ManualCoordinatesHint::default());
        self
    }
}
