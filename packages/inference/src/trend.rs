//! Additive trend + seasonality crime count forecaster.
//!
//! The artifact is the fitted state of a decomposable time-series model:
//!
//! ```text
//! t       = (date - start) / t_scale_days
//! trend   = (k + Σ δⱼ·[t ≥ sⱼ]) · t + (m + Σ -sⱼ·δⱼ·[t ≥ sⱼ])
//! season  = Σ βₙ · {sin, cos}(2π·i·d / period)      d = days since 1970-01-01
//! yhat    = (trend + season) · y_scale
//! ```
//!
//! The uncertainty band is an empirical residual interval stored as
//! offsets from `yhat`, so lower and upper bounds may be asymmetric.
//! Evaluation is pure: the same date always yields the same prediction.

use std::cmp::Ordering;
use std::f64::consts::PI;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    ArtifactError, InferenceError, ModelUnavailableError, TrendModel, TrendPrediction,
    load_artifact,
};

/// Serialized trend model.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendArtifact {
    /// First date of the training history.
    pub start: NaiveDate,
    /// Length of the training history in days.
    pub t_scale_days: f64,
    /// Scale applied to the modelled series.
    pub y_scale: f64,
    /// Base growth rate.
    pub k: f64,
    /// Base offset.
    pub m: f64,
    /// Changepoint locations in scaled time, ascending.
    #[serde(default)]
    pub changepoints: Vec<f64>,
    /// Rate adjustment at each changepoint.
    #[serde(default)]
    pub deltas: Vec<f64>,
    /// Fourier seasonal components.
    #[serde(default)]
    pub seasonalities: Vec<Seasonality>,
    /// Residual band around the point estimate.
    pub interval: ResidualBand,
}

/// A Fourier seasonal component.
#[derive(Debug, Clone, Deserialize)]
pub struct Seasonality {
    /// Component name (e.g. `"weekly"`).
    pub name: String,
    /// Period in days.
    pub period_days: f64,
    /// Coefficients ordered `sin₁, cos₁, sin₂, cos₂, …`.
    pub coefficients: Vec<f64>,
}

/// Offsets from `yhat` to the band edges, in output units.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResidualBand {
    /// Offset to the lower edge (usually negative).
    pub lower: f64,
    /// Offset to the upper edge (usually positive).
    pub upper: f64,
}

/// A validated trend model implementing [`TrendModel`].
#[derive(Debug, Clone)]
pub struct AdditiveTrendModel {
    artifact: TrendArtifact,
}

impl AdditiveTrendModel {
    /// Loads and validates a trend artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ModelUnavailableError`] if the file is missing, malformed,
    /// or inconsistent.
    pub fn load(path: &Path) -> Result<Self, ModelUnavailableError> {
        let artifact: TrendArtifact = load_artifact("crime trend", path)?;
        let model = Self::from_artifact(artifact)
            .map_err(|e| ModelUnavailableError::new("crime trend", path, e))?;
        log::info!(
            "Loaded crime trend model: {} changepoints, {} seasonalities, history from {}",
            model.artifact.changepoints.len(),
            model.artifact.seasonalities.len(),
            model.artifact.start
        );
        Ok(model)
    }

    /// Validates an in-memory artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Invalid`] on non-positive scales,
    /// mismatched changepoint/delta counts, malformed seasonalities, or an
    /// inverted residual band.
    pub fn from_artifact(artifact: TrendArtifact) -> Result<Self, ArtifactError> {
        let invalid = |message: &str| ArtifactError::Invalid {
            message: message.to_string(),
        };

        if !(artifact.t_scale_days.is_finite() && artifact.t_scale_days > 0.0) {
            return Err(invalid("t_scale_days must be positive"));
        }
        if !(artifact.y_scale.is_finite() && artifact.y_scale > 0.0) {
            return Err(invalid("y_scale must be positive"));
        }
        if !artifact.k.is_finite() || !artifact.m.is_finite() {
            return Err(invalid("k and m must be finite"));
        }
        if artifact.changepoints.len() != artifact.deltas.len() {
            return Err(invalid("changepoints and deltas differ in length"));
        }
        if artifact.changepoints.windows(2).any(|w| w[0] > w[1]) {
            return Err(invalid("changepoints must be ascending"));
        }
        for season in &artifact.seasonalities {
            if !(season.period_days.is_finite() && season.period_days > 0.0) {
                return Err(ArtifactError::Invalid {
                    message: format!("seasonality '{}' has a non-positive period", season.name),
                });
            }
            if season.coefficients.is_empty() || season.coefficients.len() % 2 != 0 {
                return Err(ArtifactError::Invalid {
                    message: format!(
                        "seasonality '{}' needs an even, non-zero coefficient count",
                        season.name
                    ),
                });
            }
        }
        if !matches!(
            artifact.interval.lower.partial_cmp(&artifact.interval.upper),
            Some(Ordering::Less | Ordering::Equal)
        ) {
            return Err(invalid("interval lower offset exceeds upper offset"));
        }

        Ok(Self { artifact })
    }

    fn trend(&self, t: f64) -> f64 {
        let a = &self.artifact;
        let mut rate = a.k;
        let mut offset = a.m;
        for (s, delta) in a.changepoints.iter().zip(&a.deltas) {
            if t >= *s {
                rate += delta;
                offset -= s * delta;
            }
        }
        rate.mul_add(t, offset)
    }

    fn seasonal(&self, days_since_epoch: f64) -> f64 {
        self.artifact
            .seasonalities
            .iter()
            .map(|season| {
                season
                    .coefficients
                    .chunks_exact(2)
                    .enumerate()
                    .map(|(i, pair)| {
                        #[allow(clippy::cast_precision_loss)]
                        let order = (i + 1) as f64;
                        let x = 2.0 * PI * order * days_since_epoch / season.period_days;
                        pair[0].mul_add(x.sin(), pair[1] * x.cos())
                    })
                    .sum::<f64>()
            })
            .sum()
    }
}

impl TrendModel for AdditiveTrendModel {
    fn predict(&self, date: NaiveDate) -> Result<TrendPrediction, InferenceError> {
        let a = &self.artifact;

        #[allow(clippy::cast_precision_loss)]
        let days_from_start = (date - a.start).num_days() as f64;
        #[allow(clippy::cast_precision_loss)]
        let days_since_epoch = (date - NaiveDate::default()).num_days() as f64;

        let t = days_from_start / a.t_scale_days;
        let yhat = (self.trend(t) + self.seasonal(days_since_epoch)) * a.y_scale;

        if !yhat.is_finite() {
            return Err(InferenceError::NonFinitePrediction {
                input: date.to_string(),
            });
        }

        Ok(TrendPrediction {
            yhat,
            lower: yhat + a.interval.lower,
            upper: yhat + a.interval.upper,
        })
    }
}
