#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! High-risk zone lookups against a precomputed density clustering.
//!
//! A historical incident population is clustered once, offline, with
//! DBSCAN over standardized `(latitude, longitude)` pairs ([`fit`]). The
//! resulting core samples are stored in a JSON artifact. At startup the
//! core samples are loaded into an R-tree ([`RiskZoneIndex`]) and each
//! query point is scaled with the population's scaler and matched to its
//! nearest core sample: within `eps` it joins that cluster, otherwise it
//! is noise. Nothing is re-fitted per request.

pub mod fit;
pub mod incidents;
pub mod progress;

use std::path::Path;

use crime_insight_inference::{
    ArtifactError, InferenceError, ModelUnavailableError, ZoneLookup, ZoneModel, load_artifact,
};
use crime_insight_risk_models::{ClusterAssignment, GeoPoint};
use geo::{Distance, Haversine};
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cluster ids flagged as high risk when an artifact does not list any.
pub const DEFAULT_HIGH_RISK_CLUSTERS: &[i32] = &[1];

/// Errors from fitting or persisting risk zones.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Fit parameters are unusable.
    #[error("Invalid parameters: {message}")]
    InvalidParams {
        /// Description.
        message: String,
    },

    /// A required coordinate column is absent from the CSV header.
    #[error("Missing column: {message}")]
    MissingColumn {
        /// Which column was expected and the headers that were found.
        message: String,
    },

    /// No valid historical points to fit.
    #[error("No valid incident coordinates to cluster")]
    EmptyPopulation,
}

/// Per-axis standardization fitted on the historical population.
///
/// Axis order is `[latitude, longitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-axis mean.
    pub mean: [f64; 2],
    /// Per-axis population standard deviation (1.0 for constant axes).
    pub scale: [f64; 2],
}

impl StandardScaler {
    /// Fits mean and population standard deviation per axis.
    ///
    /// Returns `None` for an empty slice. Axes with (near) zero deviation
    /// get a scale of 1.0 so constant coordinates stay finite.
    #[must_use]
    pub fn fit(points: &[GeoPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let n = points.len() as f64;
        let axes = |p: &GeoPoint| [p.latitude(), p.longitude()];

        let mut mean = [0.0; 2];
        for p in points {
            let v = axes(p);
            mean[0] += v[0];
            mean[1] += v[1];
        }
        mean[0] /= n;
        mean[1] /= n;

        let mut var = [0.0; 2];
        for p in points {
            let v = axes(p);
            var[0] += (v[0] - mean[0]).powi(2);
            var[1] += (v[1] - mean[1]).powi(2);
        }

        let scale = var.map(|v| {
            let std = (v / n).sqrt();
            if std < 10.0 * f64::EPSILON { 1.0 } else { std }
        });

        Some(Self { mean, scale })
    }

    /// Maps a point into the standardized space.
    #[must_use]
    pub fn transform(&self, point: GeoPoint) -> [f64; 2] {
        [
            (point.latitude() - self.mean[0]) / self.scale[0],
            (point.longitude() - self.mean[1]) / self.scale[1],
        ]
    }
}

/// A core sample of the fitted clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreSample {
    /// Latitude of the historical incident.
    pub latitude: f64,
    /// Longitude of the historical incident.
    pub longitude: f64,
    /// Cluster the sample belongs to.
    pub cluster: i32,
}

/// Counts recorded at fit time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitSummary {
    /// Points clustered.
    pub n_points: usize,
    /// Clusters found.
    pub n_clusters: usize,
    /// Core samples.
    pub n_core: usize,
    /// Points labelled noise.
    pub n_noise: usize,
}

/// Serialized risk zone model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskZoneArtifact {
    /// Neighborhood radius in standardized units.
    pub eps: f64,
    /// Minimum neighborhood size (the point included) for a core sample.
    pub min_samples: usize,
    /// Scaler fitted on the historical population.
    pub scaler: StandardScaler,
    /// Core samples with their cluster ids.
    pub core_samples: Vec<CoreSample>,
    /// Cluster ids that count as high risk.
    #[serde(default = "default_high_risk_clusters")]
    pub high_risk_clusters: Vec<i32>,
    /// Fit-time counts.
    #[serde(default)]
    pub summary: FitSummary,
}

fn default_high_risk_clusters() -> Vec<i32> {
    DEFAULT_HIGH_RISK_CLUSTERS.to_vec()
}

impl RiskZoneArtifact {
    /// Writes the artifact as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), SpatialError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// A core sample stored in the R-tree, keyed by its standardized position.
struct CoreEntry {
    scaled: [f64; 2],
    cluster: i32,
    location: geo::Point<f64>,
}

impl RTreeObject for CoreEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.scaled)
    }
}

impl PointDistance for CoreEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.scaled[0] - point[0];
        let dy = self.scaled[1] - point[1];
        dx.mul_add(dx, dy * dy)
    }
}

/// Pre-built R-tree over the core samples of a fitted clustering.
///
/// Constructed once at startup and shared read-only across requests.
pub struct RiskZoneIndex {
    cores: RTree<CoreEntry>,
    scaler: StandardScaler,
    eps: f64,
    min_samples: usize,
    high_risk_clusters: Vec<i32>,
}

impl RiskZoneIndex {
    /// Loads a risk zone artifact and builds the R-tree.
    ///
    /// # Errors
    ///
    /// Returns [`ModelUnavailableError`] if the file is missing, malformed,
    /// or inconsistent.
    pub fn load(path: &Path) -> Result<Self, ModelUnavailableError> {
        let artifact: RiskZoneArtifact = load_artifact("risk zone", path)?;
        let index = Self::from_artifact(artifact)
            .map_err(|e| ModelUnavailableError::new("risk zone", path, e))?;
        log::info!(
            "Loaded {} core samples into risk zone index (eps={}, min_samples={}, high risk clusters {:?})",
            index.cores.size(),
            index.eps,
            index.min_samples,
            index.high_risk_clusters
        );
        Ok(index)
    }

    /// Builds an index from an in-memory artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Invalid`] for a non-positive `eps`, a zero
    /// `min_samples`, a non-positive scale, or a core sample with invalid
    /// coordinates or a negative cluster id.
    pub fn from_artifact(artifact: RiskZoneArtifact) -> Result<Self, ArtifactError> {
        let invalid = |message: String| ArtifactError::Invalid { message };

        if !(artifact.eps.is_finite() && artifact.eps > 0.0) {
            return Err(invalid(format!("eps must be positive, got {}", artifact.eps)));
        }
        if artifact.min_samples == 0 {
            return Err(invalid("min_samples must be at least 1".to_string()));
        }
        let scaler = artifact.scaler;
        if scaler
            .mean
            .iter()
            .chain(&scaler.scale)
            .any(|v| !v.is_finite())
            || scaler.scale.iter().any(|s| *s <= 0.0)
        {
            return Err(invalid(format!("invalid scaler {scaler:?}")));
        }

        let mut entries = Vec::with_capacity(artifact.core_samples.len());
        for (i, core) in artifact.core_samples.iter().enumerate() {
            let point = GeoPoint::new(core.latitude, core.longitude)
                .map_err(|e| invalid(format!("core sample {i}: {e}")))?;
            if core.cluster < 0 {
                return Err(invalid(format!(
                    "core sample {i} has noise label {}",
                    core.cluster
                )));
            }
            entries.push(CoreEntry {
                scaled: scaler.transform(point),
                cluster: core.cluster,
                location: geo::Point::new(point.longitude(), point.latitude()),
            });
        }

        if entries.is_empty() {
            log::warn!("Risk zone artifact has no core samples; every point will be noise");
        }

        Ok(Self {
            cores: RTree::bulk_load(entries),
            scaler,
            eps: artifact.eps,
            min_samples: artifact.min_samples,
            high_risk_clusters: artifact.high_risk_clusters,
        })
    }

    /// Neighborhood radius in standardized units.
    #[must_use]
    pub const fn eps(&self) -> f64 {
        self.eps
    }

    /// Minimum neighborhood size the clustering was fitted with.
    #[must_use]
    pub const fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Number of core samples in the index.
    #[must_use]
    pub fn core_count(&self) -> usize {
        self.cores.size()
    }
}

impl ZoneModel for RiskZoneIndex {
    fn assign(&self, point: GeoPoint) -> Result<ZoneLookup, InferenceError> {
        let scaled = self.scaler.transform(point);
        if scaled.iter().any(|v| !v.is_finite()) {
            return Err(InferenceError::NonFinitePrediction {
                input: point.to_string(),
            });
        }

        let Some(nearest) = self.cores.nearest_neighbor(&scaled) else {
            return Ok(ZoneLookup {
                assignment: ClusterAssignment::Noise,
                nearest_core_distance_m: None,
            });
        };

        let within_eps = nearest.distance_2(&scaled) <= self.eps * self.eps;
        let query = geo::Point::new(point.longitude(), point.latitude());

        Ok(ZoneLookup {
            assignment: if within_eps {
                ClusterAssignment::Cluster {
                    id: nearest.cluster,
                }
            } else {
                ClusterAssignment::Noise
            },
            nearest_core_distance_m: Some(Haversine.distance(query, nearest.location)),
        })
    }

    fn high_risk_clusters(&self) -> &[i32] {
        &self.high_risk_clusters
    }
}
