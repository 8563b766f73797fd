#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Inference seams for the three trained models behind crime insight.
//!
//! The assessment service only talks to the traits defined here:
//!
//! - [`CrimeTypeModel`]: feature vector in, integer class id out.
//! - [`TrendModel`]: calendar date in, crime count estimate with an
//!   uncertainty band out.
//! - [`ZoneModel`]: coordinate in, cluster assignment out.
//!
//! Artifact-backed implementations of the first two live in [`forest`]
//! and [`trend`]; the zone model lives in `crime_insight_spatial`. All
//! artifacts are JSON files loaded once at startup through
//! [`load_artifact`] and never mutated afterwards.

pub mod forest;
pub mod trend;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use crime_insight_risk_models::{ClusterAssignment, FeatureVector, GeoPoint};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors raised by a model while serving a single prediction.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// An input feature was NaN or infinite.
    #[error("Non-finite value for feature '{feature}'")]
    NonFiniteFeature {
        /// Feature name.
        feature: String,
    },

    /// The model produced NaN or infinity.
    #[error("Model produced a non-finite prediction for {input}")]
    NonFinitePrediction {
        /// Description of the input.
        input: String,
    },

    /// Any other model failure.
    #[error("Inference failed: {message}")]
    Model {
        /// Description of what went wrong.
        message: String,
    },
}

/// Why an artifact could not be loaded.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// File could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid JSON for the artifact schema.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File parsed but its contents are inconsistent.
    #[error("Invalid artifact: {message}")]
    Invalid {
        /// Description of the inconsistency.
        message: String,
    },
}

/// A model artifact failed to load at startup. The process must not serve
/// requests without it.
#[derive(Debug, Error)]
#[error("Model '{model}' unavailable at {}: {source}", .path.display())]
pub struct ModelUnavailableError {
    /// Logical model name (e.g. `"crime type"`).
    pub model: String,
    /// Artifact path that was tried.
    pub path: PathBuf,
    /// Underlying cause.
    pub source: ArtifactError,
}

impl ModelUnavailableError {
    /// Wraps an [`ArtifactError`] with the model name and path.
    #[must_use]
    pub fn new(model: &str, path: &Path, source: ArtifactError) -> Self {
        Self {
            model: model.to_string(),
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Crime type classifier.
pub trait CrimeTypeModel: Send + Sync {
    /// Returns the predicted class id.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] if the model cannot score the input.
    fn predict(&self, features: &FeatureVector) -> Result<i64, InferenceError>;
}

/// Raw output of a [`TrendModel`] for one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPrediction {
    /// Point estimate.
    pub yhat: f64,
    /// Lower edge of the uncertainty band.
    pub lower: f64,
    /// Upper edge of the uncertainty band.
    pub upper: f64,
}

/// Univariate crime count forecaster.
pub trait TrendModel: Send + Sync {
    /// Forecasts the crime count for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] if the model cannot score the date.
    fn predict(&self, date: NaiveDate) -> Result<TrendPrediction, InferenceError>;
}

/// Nearest-core-sample lookup against a fitted density clustering.
pub trait ZoneModel: Send + Sync {
    /// Assigns `point` to a cluster or to noise.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] if the point cannot be scored.
    fn assign(&self, point: GeoPoint) -> Result<ZoneLookup, InferenceError>;

    /// Cluster ids that count as high risk.
    fn high_risk_clusters(&self) -> &[i32];
}

/// Result of a [`ZoneModel`] lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneLookup {
    /// Cluster the point falls in.
    pub assignment: ClusterAssignment,
    /// Great-circle distance to the nearest core sample, in metres.
    pub nearest_core_distance_m: Option<f64>,
}

/// Reads and deserializes a JSON artifact.
///
/// # Errors
///
/// Returns [`ModelUnavailableError`] if the file cannot be read or parsed.
pub fn load_artifact<T: DeserializeOwned>(
    model: &str,
    path: &Path,
) -> Result<T, ModelUnavailableError> {
    log::info!("Loading {model} model from {}", path.display());

    let bytes = std::fs::read(path)
        .map_err(|e| ModelUnavailableError::new(model, path, ArtifactError::Io(e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| ModelUnavailableError::new(model, path, ArtifactError::Json(e)))
}

/// Fails with [`InferenceError::NonFiniteFeature`] on the first NaN or
/// infinite entry.
///
/// # Errors
///
/// Returns [`InferenceError::NonFiniteFeature`] naming the offending feature.
pub fn ensure_finite(features: &FeatureVector) -> Result<(), InferenceError> {
    features
        .to_array()
        .iter()
        .zip(crime_insight_risk_models::FEATURE_NAMES)
        .find(|(value, _)| !value.is_finite())
        .map_or(Ok(()), |(_, name)| {
            Err(InferenceError::NonFiniteFeature {
                feature: name.to_string(),
            })
        })
}
