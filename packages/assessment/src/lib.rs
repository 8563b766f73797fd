#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime risk assessment for a location, hour, and future date.
//!
//! [`RiskAssessmentService`] ties the collaborators together. A single
//! assessment runs these steps in order:
//!
//! 1. Resolve the location (place text, coordinates, or current position)
//!    to a [`GeoPoint`] and describe it with reverse geocoding.
//! 2. Predict the most likely crime type at that point and hour.
//! 3. Look the point up against the fitted risk zones.
//! 4. Derive the temporal risk from the hour.
//! 5. Forecast the crime count for the requested date.
//!
//! Only step 1 can fail the whole assessment. Each model-backed result
//! carries its own `Result`, so one failing model does not hide the
//! others.

pub mod classifier;
pub mod config;
pub mod forecast;
pub mod location;
pub mod request;
pub mod risk;

#[cfg(test)]
mod fakes;

use std::sync::Arc;

use chrono::NaiveDate;
use crime_insight_geocoder::GeocodeError;
use crime_insight_inference::forest::RandomForestModel;
use crime_insight_inference::trend::AdditiveTrendModel;
use crime_insight_inference::ModelUnavailableError;
use crime_insight_risk_models::{
    AddressInfo, CrimeType, ForecastPoint, GeoPoint, SpatialAssessment, TemporalRisk,
};
use crime_insight_spatial::RiskZoneIndex;
use thiserror::Error;

use crate::classifier::CrimeTypeClassifier;
use crate::config::ModelPaths;
use crate::forecast::TrendForecaster;
use crate::location::{LocationResolver, ResolutionError};
use crate::request::{AssessmentRequest, LocationInput, ValidatedRequest};
use crate::risk::RiskZoneEvaluator;

pub use crime_insight_inference::InferenceError;

/// Errors that abort an assessment.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// The request failed validation.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// What was wrong with the request.
        message: String,
    },

    /// The location could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// Errors that prevent the service from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    /// A model artifact is missing or malformed.
    #[error(transparent)]
    Model(#[from] ModelUnavailableError),

    /// No usable geocoding service is configured.
    #[error(transparent)]
    Geocoder(#[from] GeocodeError),
}

/// Everything known about one location, hour, and date.
#[derive(Debug)]
pub struct AssessmentResult {
    /// Resolved coordinates.
    pub point: GeoPoint,
    /// Reverse geocoded address (empty when the lookup failed).
    pub address: AddressInfo,
    /// Hour the assessment was made for.
    pub hour: u8,
    /// Most likely crime type.
    pub crime_type: Result<CrimeType, InferenceError>,
    /// Risk zone membership.
    pub spatial_risk: Result<SpatialAssessment, InferenceError>,
    /// Risk from the hour of day.
    pub temporal_risk: TemporalRisk,
    /// Crime count forecast for the requested date.
    pub forecast: Result<ForecastPoint, InferenceError>,
}

/// The assessment service. Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct RiskAssessmentService {
    resolver: LocationResolver,
    classifier: CrimeTypeClassifier,
    zones: RiskZoneEvaluator,
    forecaster: TrendForecaster,
}

impl RiskAssessmentService {
    /// Assembles a service from ready collaborators.
    #[must_use]
    pub const fn new(
        resolver: LocationResolver,
        classifier: CrimeTypeClassifier,
        zones: RiskZoneEvaluator,
        forecaster: TrendForecaster,
    ) -> Self {
        Self {
            resolver,
            classifier,
            zones,
            forecaster,
        }
    }

    /// Loads the three model artifacts and connects the geocoding services
    /// from the embedded service registry.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Model`] if any artifact cannot be loaded and
    /// [`StartupError::Geocoder`] if no geocoding service is enabled.
    pub fn load(paths: &ModelPaths) -> Result<Self, StartupError> {
        log::info!("Loading models...");
        let crime_type = RandomForestModel::load(&paths.crime_type)?;
        let trend = AdditiveTrendModel::load(&paths.crime_trend)?;
        let zones = RiskZoneIndex::load(&paths.risk_zones)?;

        let client = reqwest::Client::new();
        let geocoder = crime_insight_geocoder::geocoder_from_registry(client.clone())?;
        let ip_locator = crime_insight_geocoder::ip_locator_from_registry(client)?;

        Ok(Self::new(
            LocationResolver::new(Arc::new(geocoder), Arc::new(ip_locator)),
            CrimeTypeClassifier::new(Arc::new(crime_type)),
            RiskZoneEvaluator::new(Arc::new(zones)),
            TrendForecaster::new(Arc::new(trend)),
        ))
    }

    /// Runs a full assessment.
    ///
    /// # Errors
    ///
    /// Returns [`AssessmentError::Resolution`] if the location cannot be
    /// resolved. Model failures are reported inside the result instead.
    pub async fn assess(
        &self,
        request: &ValidatedRequest,
    ) -> Result<AssessmentResult, AssessmentError> {
        log::info!(
            "Assessing {} at hour {} with forecast for {}",
            request.location,
            request.hour,
            request.future_date
        );

        let (point, address) = self.resolver.resolve(&request.location).await?;

        let crime_type = self.classifier.classify(point, request.hour);
        if let Err(e) = &crime_type {
            log::error!("Crime type prediction failed for ({point}): {e}");
        }

        let spatial_risk = self.zones.evaluate(point);
        if let Err(e) = &spatial_risk {
            log::error!("Risk zone lookup failed for ({point}): {e}");
        }

        let temporal_risk = risk::temporal_risk(request.hour);

        let forecast = self.forecaster.forecast(request.future_date);
        if let Err(e) = &forecast {
            log::error!("Forecast failed for {}: {e}", request.future_date);
        }

        Ok(AssessmentResult {
            point,
            address,
            hour: request.hour,
            crime_type,
            spatial_risk,
            temporal_risk,
            forecast,
        })
    }

    /// Validates `request` against the current local time and assesses it.
    ///
    /// # Errors
    ///
    /// Returns [`AssessmentError::InvalidRequest`] if validation fails, or
    /// any error from [`Self::assess`].
    pub async fn assess_request(
        &self,
        request: &AssessmentRequest,
    ) -> Result<AssessmentResult, AssessmentError> {
        let validated = request.validate_now()?;
        self.assess(&validated).await
    }

    /// Resolves and describes a location without running any model.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] if the location cannot be resolved.
    pub async fn resolve(
        &self,
        input: &LocationInput,
    ) -> Result<(GeoPoint, AddressInfo), ResolutionError> {
        self.resolver.resolve(input).await
    }

    /// Predicts the crime type at a known point.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] if the classifier fails.
    pub fn classify(&self, point: GeoPoint, hour: u8) -> Result<CrimeType, InferenceError> {
        self.classifier.classify(point, hour)
    }

    /// Evaluates spatial risk at a known point.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] if the zone lookup fails.
    pub fn spatial_risk(&self, point: GeoPoint) -> Result<SpatialAssessment, InferenceError> {
        self.zones.evaluate(point)
    }

    /// Forecasts the crime count for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] if the trend model fails.
    pub fn forecast(&self, date: NaiveDate) -> Result<ForecastPoint, InferenceError> {
        self.forecaster.forecast(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeGeocoder, FakeIpLocator, FixedClassifier, FixedTrend, SplitZones};
    use crime_insight_risk_models::{ClusterAssignment, SpatialRisk};

    fn service(class_id: Option<i64>, trend: Option<f64>) -> RiskAssessmentService {
        RiskAssessmentService::new(
            LocationResolver::new(
                Arc::new(FakeGeocoder::delhi()),
                Arc::new(FakeIpLocator::at(GeoPoint::new(28.6315, 77.2167).unwrap())),
            ),
            CrimeTypeClassifier::new(Arc::new(FixedClassifier(class_id))),
            RiskZoneEvaluator::new(Arc::new(SplitZones {
                split_latitude: 28.6,
                high_risk: vec![1],
            })),
            TrendForecaster::new(Arc::new(FixedTrend(trend))),
        )
    }

    fn request(location: LocationInput, hour: u8) -> ValidatedRequest {
        ValidatedRequest {
            location,
            hour,
            future_date: "2025-03-15".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn full_assessment_for_a_place() {
        let result = service(Some(4), Some(30.0))
            .assess(&request(
                LocationInput::Place("Connaught Place, Delhi, India".to_string()),
                22,
            ))
            .await
            .unwrap();

        assert_eq!(result.address.country, "India");
        assert_eq!(result.hour, 22);
        assert_eq!(result.crime_type.unwrap(), CrimeType::Theft);
        let spatial = result.spatial_risk.unwrap();
        assert_eq!(spatial.assignment, ClusterAssignment::Cluster { id: 1 });
        assert_eq!(spatial.risk, SpatialRisk::HighRiskZone);
        assert_eq!(result.temporal_risk, TemporalRisk::HighRiskTime);
        assert_eq!(result.forecast.unwrap().predicted_count, 45);
    }

    #[tokio::test]
    async fn current_location_assessment() {
        let result = service(Some(0), Some(1.0))
            .assess(&request(LocationInput::CurrentLocation, 12))
            .await
            .unwrap();
        assert!((result.point.latitude() - 28.6315).abs() < 1e-9);
        assert_eq!(result.temporal_risk, TemporalRisk::LowRisk);
    }

    #[tokio::test]
    async fn unknown_place_aborts_with_not_found() {
        let err = service(Some(0), Some(1.0))
            .assess(&request(
                LocationInput::Place("Nonexistent Place, Nowhere".to_string()),
                12,
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AssessmentError::Resolution(ResolutionError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn unlabelled_class_id_is_unknown() {
        let result = service(Some(99), Some(1.0))
            .assess(&request(
                LocationInput::Coordinates(GeoPoint::new(28.5, 77.0).unwrap()),
                9,
            ))
            .await
            .unwrap();
        assert_eq!(result.crime_type.unwrap(), CrimeType::Unknown);
    }

    #[tokio::test]
    async fn failing_models_do_not_hide_siblings() {
        let result = service(None, None)
            .assess(&request(
                LocationInput::Coordinates(GeoPoint::new(28.5, 77.0).unwrap()),
                1,
            ))
            .await
            .unwrap();
        assert!(result.crime_type.is_err());
        assert!(result.forecast.is_err());
        assert_eq!(
            result.spatial_risk.unwrap().assignment,
            ClusterAssignment::Noise
        );
        assert_eq!(result.temporal_risk, TemporalRisk::HighRiskTime);
    }

    #[tokio::test]
    async fn assess_request_validates_first() {
        let err = service(Some(0), Some(1.0))
            .assess_request(&AssessmentRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidRequest { .. }));
    }

    #[test]
    fn load_reports_missing_artifact() {
        let paths = ModelPaths {
            crime_type: "/nonexistent/crime_type_model.json".into(),
            ..ModelPaths::default()
        };
        let err = RiskAssessmentService::load(&paths).unwrap_err();
        match err {
            StartupError::Model(e) => assert_eq!(e.model, "crime type"),
            other => panic!("expected a model error, got {other:?}"),
        }
    }
}
