//! Offline DBSCAN fit over a historical incident population.
//!
//! Neighborhoods are found with an R-tree range query in the standardized
//! space. A point's neighborhood includes itself and every point at
//! distance `<= eps`; points with at least `min_samples` neighbors are
//! core samples. Clusters are grown depth-first from core samples in input
//! order and numbered from 0; unreached points are noise (`-1`).

use std::sync::Arc;

use crime_insight_risk_models::{ClusterAssignment, GeoPoint};
use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::progress::ProgressCallback;
use crate::{CoreSample, FitSummary, RiskZoneArtifact, SpatialError, StandardScaler};

/// Progress is reported every this many points.
const PROGRESS_CHUNK: usize = 1_000;

/// DBSCAN parameters plus the high-risk cluster policy to record.
#[derive(Debug, Clone, PartialEq)]
pub struct FitParams {
    /// Neighborhood radius in standardized units.
    pub eps: f64,
    /// Minimum neighborhood size (the point included) for a core sample.
    pub min_samples: usize,
    /// Cluster ids to flag as high risk in the artifact.
    pub high_risk_clusters: Vec<i32>,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            eps: 0.5,
            min_samples: 5,
            high_risk_clusters: crate::DEFAULT_HIGH_RISK_CLUSTERS.to_vec(),
        }
    }
}

/// Labels produced by [`dbscan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clustering {
    /// Cluster id per input point, `-1` for noise.
    pub labels: Vec<i32>,
    /// Whether each input point is a core sample.
    pub is_core: Vec<bool>,
    /// Number of clusters found.
    pub n_clusters: usize,
}

/// Runs DBSCAN over points that are already in the metric space.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidParams`] for a non-positive `eps` or a
/// zero `min_samples`.
pub fn dbscan(
    points: &[[f64; 2]],
    eps: f64,
    min_samples: usize,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Clustering, SpatialError> {
    if !(eps.is_finite() && eps > 0.0) {
        return Err(SpatialError::InvalidParams {
            message: format!("eps must be positive, got {eps}"),
        });
    }
    if min_samples == 0 {
        return Err(SpatialError::InvalidParams {
            message: "min_samples must be at least 1".to_string(),
        });
    }

    let tree = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new(*p, i))
            .collect(),
    );

    progress.set_message("Finding neighborhoods".to_string());
    progress.set_total(points.len() as u64);

    let eps_2 = eps * eps;
    let mut neighborhoods: Vec<Vec<usize>> = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        let mut neighbors: Vec<usize> = tree
            .locate_within_distance(*p, eps_2)
            .map(|entry| entry.data)
            .collect();
        neighbors.sort_unstable();
        neighborhoods.push(neighbors);

        if (i + 1) % PROGRESS_CHUNK == 0 {
            progress.inc(PROGRESS_CHUNK as u64);
        }
    }
    progress.inc((points.len() % PROGRESS_CHUNK) as u64);

    let is_core: Vec<bool> = neighborhoods
        .iter()
        .map(|n| n.len() >= min_samples)
        .collect();

    let mut labels = vec![ClusterAssignment::NOISE_LABEL; points.len()];
    let mut next_label: i32 = 0;
    let mut stack = Vec::new();

    for start in 0..points.len() {
        if labels[start] != ClusterAssignment::NOISE_LABEL || !is_core[start] {
            continue;
        }

        stack.push(start);
        while let Some(i) = stack.pop() {
            if labels[i] != ClusterAssignment::NOISE_LABEL {
                continue;
            }
            labels[i] = next_label;
            if is_core[i] {
                stack.extend(
                    neighborhoods[i]
                        .iter()
                        .copied()
                        .filter(|&j| labels[j] == ClusterAssignment::NOISE_LABEL),
                );
            }
        }

        next_label += 1;
    }

    Ok(Clustering {
        labels,
        is_core,
        n_clusters: usize::try_from(next_label).unwrap_or_default(),
    })
}

/// Standardizes a historical population, clusters it, and packages the
/// core samples as a [`RiskZoneArtifact`].
///
/// # Errors
///
/// Returns [`SpatialError::EmptyPopulation`] for an empty input and
/// [`SpatialError::InvalidParams`] for unusable parameters.
pub fn fit_risk_zones(
    points: &[GeoPoint],
    params: &FitParams,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RiskZoneArtifact, SpatialError> {
    let scaler = StandardScaler::fit(points).ok_or(SpatialError::EmptyPopulation)?;
    log::info!(
        "Fitted scaler on {} points: mean={:?} scale={:?}",
        points.len(),
        scaler.mean,
        scaler.scale
    );

    let scaled: Vec<[f64; 2]> = points.iter().map(|p| scaler.transform(*p)).collect();
    let clustering = dbscan(&scaled, params.eps, params.min_samples, progress)?;

    let core_samples: Vec<CoreSample> = points
        .iter()
        .zip(&clustering.labels)
        .zip(&clustering.is_core)
        .filter(|(_, core)| **core)
        .map(|((p, label), _)| CoreSample {
            latitude: p.latitude(),
            longitude: p.longitude(),
            cluster: *label,
        })
        .collect();

    let summary = FitSummary {
        n_points: points.len(),
        n_clusters: clustering.n_clusters,
        n_core: core_samples.len(),
        n_noise: clustering
            .labels
            .iter()
            .filter(|l| **l == ClusterAssignment::NOISE_LABEL)
            .count(),
    };

    for id in &params.high_risk_clusters {
        if usize::try_from(*id).map_or(true, |id| id >= summary.n_clusters) {
            log::warn!(
                "High risk cluster {id} does not exist in this fit ({} clusters)",
                summary.n_clusters
            );
        }
    }

    progress.finish(format!(
        "{} clusters, {} core samples, {} noise points",
        summary.n_clusters, summary.n_core, summary.n_noise
    ));

    Ok(RiskZoneArtifact {
        eps: params.eps,
        min_samples: params.min_samples,
        scaler,
        core_samples,
        high_risk_clusters: params.high_risk_clusters.clone(),
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RiskZoneIndex;
    use crate::progress::null_progress;
    use crime_insight_inference::ZoneModel;

    /// Two tight groups of five points plus one far outlier.
    fn two_groups() -> Vec<[f64; 2]> {
        let mut points = Vec::new();
        for i in 0..5 {
            let d = f64::from(i) * 0.01;
            points.push([0.0 + d, 0.0]);
        }
        for i in 0..5 {
            let d = f64::from(i) * 0.01;
            points.push([5.0, 5.0 + d]);
        }
        points.push([20.0, -20.0]);
        points
    }

    #[test]
    fn separates_groups_from_noise() {
        let clustering = dbscan(&two_groups(), 0.1, 3, &null_progress()).unwrap();
        assert_eq!(clustering.n_clusters, 2);
        assert!(clustering.labels[..5].iter().all(|l| *l == 0));
        assert!(clustering.labels[5..10].iter().all(|l| *l == 1));
        assert_eq!(clustering.labels[10], -1);
        assert!(!clustering.is_core[10]);
    }

    #[test]
    fn border_points_join_but_are_not_core() {
        // Chain: 0.0, 0.1, 0.2 with eps 0.1 and min_samples 3. Only the
        // middle point has three neighbors.
        let points = [[0.0, 0.0], [0.1, 0.0], [0.2, 0.0]];
        let clustering = dbscan(&points, 0.1, 3, &null_progress()).unwrap();
        assert_eq!(clustering.labels, vec![0, 0, 0]);
        assert_eq!(clustering.is_core, vec![false, true, false]);
    }

    #[test]
    fn min_samples_one_makes_every_point_core() {
        let points = [[0.0, 0.0], [10.0, 10.0]];
        let clustering = dbscan(&points, 0.5, 1, &null_progress()).unwrap();
        assert_eq!(clustering.labels, vec![0, 1]);
        assert_eq!(clustering.is_core, vec![true, true]);
    }

    #[test]
    fn rejects_invalid_params() {
        assert!(dbscan(&two_groups(), 0.0, 3, &null_progress()).is_err());
        assert!(dbscan(&two_groups(), 0.1, 0, &null_progress()).is_err());
    }

    #[test]
    fn empty_population_is_an_error() {
        let err = fit_risk_zones(&[], &FitParams::default(), &null_progress()).unwrap_err();
        assert!(matches!(err, SpatialError::EmptyPopulation));
    }

    #[test]
    fn fitted_artifact_classifies_new_points() {
        // Dense hotspot around Connaught Place, a second one around Saket,
        // and scattered points in between.
        let mut points = Vec::new();
        for i in 0..20 {
            let d = f64::from(i % 5) * 0.0005;
            let e = f64::from(i / 5) * 0.0005;
            points.push(GeoPoint::new(28.6315 + d, 77.2167 + e).unwrap());
            points.push(GeoPoint::new(28.5245 + d, 77.2066 + e).unwrap());
        }
        points.push(GeoPoint::new(28.58, 77.30).unwrap());
        points.push(GeoPoint::new(28.70, 77.10).unwrap());

        let params = FitParams {
            eps: 0.1,
            min_samples: 5,
            high_risk_clusters: vec![1],
        };
        let artifact = fit_risk_zones(&points, &params, &null_progress()).unwrap();
        assert_eq!(artifact.summary.n_points, 42);
        assert_eq!(artifact.summary.n_clusters, 2);
        assert_eq!(artifact.summary.n_noise, 2);
        assert_eq!(artifact.summary.n_core, 40);

        let index = RiskZoneIndex::from_artifact(artifact).unwrap();
        let near_saket = index
            .assign(GeoPoint::new(28.5250, 77.2070).unwrap())
            .unwrap();
        assert_eq!(
            near_saket.assignment,
            ClusterAssignment::Cluster { id: 1 }
        );
        let outlier = index.assign(GeoPoint::new(28.70, 77.10).unwrap()).unwrap();
        assert_eq!(outlier.assignment, ClusterAssignment::Noise);
    }
}
