//! Plain-text rendering of an assessment for the terminal.

use std::fmt;

use crime_insight_assessment::AssessmentResult;
use crime_insight_risk_models::{AddressInfo, ClusterAssignment};

/// Displays an [`AssessmentResult`] as a terminal report.
pub struct Report<'a>(pub &'a AssessmentResult);

fn or_unknown(value: &str) -> &str {
    if value.is_empty() { "Unknown" } else { value }
}

fn write_address(f: &mut fmt::Formatter<'_>, address: &AddressInfo) -> fmt::Result {
    if address.is_empty() {
        return writeln!(f, "  Address: unavailable");
    }
    writeln!(f, "  Country: {}", or_unknown(&address.country))?;
    writeln!(f, "  State: {}", or_unknown(&address.state))?;
    writeln!(f, "  District: {}", or_unknown(&address.district))?;
    writeln!(f, "  Locality: {}", or_unknown(&address.locality))
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;

        writeln!(f, "Location Info")?;
        writeln!(f, "  Coordinates: {}", result.point)?;
        write_address(f, &result.address)?;
        writeln!(f)?;

        writeln!(f, "Crime Type Prediction")?;
        match &result.crime_type {
            Ok(crime_type) => {
                writeln!(f, "  Predicted Crime Type: {crime_type}")?;
                writeln!(f, "  {}", crime_type.advisory())?;
            }
            Err(e) => writeln!(f, "  Unavailable: {e}")?,
        }
        writeln!(f)?;

        match &result.spatial_risk {
            Ok(spatial) => {
                write!(f, "Risk Zone Status: {}", spatial.risk)?;
                match (spatial.assignment, spatial.nearest_core_distance_m) {
                    (ClusterAssignment::Cluster { id }, Some(d)) => {
                        write!(f, " (cluster {id}, {d:.0} m from hotspot core)")?;
                    }
                    (ClusterAssignment::Cluster { id }, None) => write!(f, " (cluster {id})")?,
                    (ClusterAssignment::Noise, Some(d)) => {
                        write!(f, " (nearest hotspot core {d:.0} m away)")?;
                    }
                    (ClusterAssignment::Noise, None) => {}
                }
                writeln!(f)?;
            }
            Err(e) => writeln!(f, "Risk Zone Status: unavailable: {e}")?,
        }
        writeln!(
            f,
            "Time Risk (hour {}): {}",
            result.hour, result.temporal_risk
        )?;
        writeln!(f)?;

        writeln!(f, "Crime Trend Forecast")?;
        match &result.forecast {
            Ok(point) => writeln!(
                f,
                "  Predicted Crime Count on {}: {} incidents (range {:.1} to {:.1})",
                point.date, point.predicted_count, point.lower_bound, point.upper_bound
            ),
            Err(e) => writeln!(f, "  Unavailable: {e}"),
        }
    }
}
