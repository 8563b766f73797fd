//! Model artifact locations, read from the environment at startup.

use std::path::PathBuf;

/// Environment variable overriding the crime type model path.
pub const CRIME_TYPE_MODEL_ENV: &str = "CRIME_TYPE_MODEL";
/// Environment variable overriding the crime trend model path.
pub const CRIME_TREND_MODEL_ENV: &str = "CRIME_TREND_MODEL";
/// Environment variable overriding the risk zone model path.
pub const RISK_ZONES_MODEL_ENV: &str = "RISK_ZONES_MODEL";

const DEFAULT_CRIME_TYPE_MODEL: &str = "models/crime_type_model.json";
const DEFAULT_CRIME_TREND_MODEL: &str = "models/crime_trend_model.json";
const DEFAULT_RISK_ZONES_MODEL: &str = "models/high_risk_zones_model.json";

/// Paths to the three model artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    /// Random forest crime type classifier.
    pub crime_type: PathBuf,
    /// Additive trend forecaster.
    pub crime_trend: PathBuf,
    /// Fitted risk zone clustering.
    pub risk_zones: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            crime_type: PathBuf::from(DEFAULT_CRIME_TYPE_MODEL),
            crime_trend: PathBuf::from(DEFAULT_CRIME_TREND_MODEL),
            risk_zones: PathBuf::from(DEFAULT_RISK_ZONES_MODEL),
        }
    }
}

impl ModelPaths {
    /// Reads the paths from `CRIME_TYPE_MODEL`, `CRIME_TREND_MODEL`, and
    /// `RISK_ZONES_MODEL`, falling back to the `models/` defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let path = |key: &str, default: PathBuf| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map_or(default, PathBuf::from)
        };

        Self {
            crime_type: path(CRIME_TYPE_MODEL_ENV, defaults.crime_type),
            crime_trend: path(CRIME_TREND_MODEL_ENV, defaults.crime_trend),
            risk_zones: path(RISK_ZONES_MODEL_ENV, defaults.risk_zones),
        }
    }
}
