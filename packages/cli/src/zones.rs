//! `fit-zones`: cluster a historical incident CSV into a risk zone artifact.

use std::path::Path;

use crime_insight_cli_utils::{IndicatifProgress, MultiProgress};
use crime_insight_spatial::fit::{FitParams, fit_risk_zones};
use crime_insight_spatial::incidents::read_incidents_csv;
use crime_insight_spatial::{FitSummary, SpatialError};

/// Reads `input`, fits risk zones with `params`, and writes the artifact
/// to `output`.
///
/// # Errors
///
/// Returns [`SpatialError`] if the CSV cannot be read, the population is
/// empty, the parameters are invalid, or the artifact cannot be written.
pub fn fit_zones(
    multi: &MultiProgress,
    input: &Path,
    output: &Path,
    params: &FitParams,
) -> Result<FitSummary, SpatialError> {
    log::info!(
        "Fitting risk zones from {} (eps={}, min_samples={})",
        input.display(),
        params.eps,
        params.min_samples
    );

    let points = read_incidents_csv(input)?;
    let progress = IndicatifProgress::fit_bar(multi, "Clustering incidents");
    let artifact = fit_risk_zones(&points, params, &progress)?;
    artifact.save(output)?;

    log::info!(
        "Wrote {} core samples in {} clusters to {}",
        artifact.summary.n_core,
        artifact.summary.n_clusters,
        output.display()
    );

    Ok(artifact.summary)
}
