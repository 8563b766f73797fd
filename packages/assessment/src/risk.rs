//! Spatial and temporal risk evaluation.

use std::sync::Arc;

use crime_insight_inference::{InferenceError, ZoneModel};
use crime_insight_risk_models::{
    ClusterAssignment, GeoPoint, SpatialAssessment, SpatialRisk, TemporalRisk,
};

/// Hours of day treated as high risk.
pub const HIGH_RISK_HOURS: [u8; 7] = [20, 21, 22, 23, 0, 1, 2];

/// Temporal risk for an hour of day.
#[must_use]
pub fn temporal_risk(hour: u8) -> TemporalRisk {
    if HIGH_RISK_HOURS.contains(&hour) {
        TemporalRisk::HighRiskTime
    } else {
        TemporalRisk::LowRisk
    }
}

/// Looks points up against the fitted risk zones.
#[derive(Clone)]
pub struct RiskZoneEvaluator {
    model: Arc<dyn ZoneModel>,
}

impl std::fmt::Debug for RiskZoneEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskZoneEvaluator").finish_non_exhaustive()
    }
}

impl RiskZoneEvaluator {
    /// Wraps a loaded zone model.
    #[must_use]
    pub fn new(model: Arc<dyn ZoneModel>) -> Self {
        Self { model }
    }

    /// Assigns `point` to a cluster and derives its spatial risk.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] if the zone model cannot score the point.
    pub fn evaluate(&self, point: GeoPoint) -> Result<SpatialAssessment, InferenceError> {
        let lookup = self.model.assign(point)?;

        let risk = match lookup.assignment {
            ClusterAssignment::Cluster { id } if self.model.high_risk_clusters().contains(&id) => {
                SpatialRisk::HighRiskZone
            }
            ClusterAssignment::Cluster { .. } | ClusterAssignment::Noise => SpatialRisk::SafeZone,
        };

        log::debug!(
            "Point ({point}) assigned to {:?}: {risk}",
            lookup.assignment
        );

        Ok(SpatialAssessment {
            assignment: lookup.assignment,
            risk,
            nearest_core_distance_m: lookup.nearest_core_distance_m,
        })
    }
}
