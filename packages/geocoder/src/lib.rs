#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding collaborators for crime risk assessment.
//!
//! Three lookups are exposed behind traits so the assessment service can
//! be driven by real network clients or in-memory fakes:
//!
//! 1. **Forward geocoding**: free-form place text to a [`GeoPoint`].
//! 2. **Reverse geocoding**: a [`GeoPoint`] to an [`AddressInfo`]
//!    breakdown (country, state, district, locality).
//! 3. **IP geolocation**: the caller's approximate position.
//!
//! Providers are configured by TOML files in `services/`, embedded at
//! compile time and exposed through the [`service_registry`].

pub mod ip;
pub mod nominatim;
pub mod service_registry;

use crime_insight_risk_models::{AddressInfo, GeoPoint};
use thiserror::Error;

use crate::service_registry::ProviderConfig;

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// No usable provider is configured.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

/// Forward and reverse geocoding.
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves free-form place text to coordinates.
    ///
    /// Returns `Ok(None)` when the provider has no match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError>;

    /// Resolves coordinates to an address breakdown.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn reverse(&self, point: GeoPoint) -> Result<AddressInfo, GeocodeError>;
}

/// Approximate location of the current machine.
#[async_trait::async_trait]
pub trait IpLocator: Send + Sync {
    /// Returns `Ok(None)` when the provider cannot place this address.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn locate(&self) -> Result<Option<GeoPoint>, GeocodeError>;
}

/// Builds the highest-priority enabled forward/reverse geocoder.
///
/// # Errors
///
/// Returns [`GeocodeError::Config`] if no Nominatim service is enabled.
pub fn geocoder_from_registry(
    client: reqwest::Client,
) -> Result<nominatim::NominatimGeocoder, GeocodeError> {
    service_registry::enabled_services()
        .into_iter()
        .find_map(|svc| match svc.provider {
            ProviderConfig::Nominatim { .. } => {
                log::info!("Using geocoding service '{}' ({})", svc.id, svc.name);
                nominatim::NominatimGeocoder::from_config(client.clone(), &svc.provider)
            }
            ProviderConfig::IpInfo { .. } => None,
        })
        .ok_or_else(|| GeocodeError::Config {
            message: "no enabled Nominatim geocoding service".to_string(),
        })
}

/// Builds the highest-priority enabled IP locator.
///
/// # Errors
///
/// Returns [`GeocodeError::Config`] if no IP location service is enabled.
pub fn ip_locator_from_registry(
    client: reqwest::Client,
) -> Result<ip::IpInfoLocator, GeocodeError> {
    service_registry::enabled_services()
        .into_iter()
        .find_map(|svc| match svc.provider {
            ProviderConfig::IpInfo { base_url } => {
                log::info!("Using IP location service '{}' ({})", svc.id, svc.name);
                Some(ip::IpInfoLocator::new(client.clone(), base_url))
            }
            ProviderConfig::Nominatim { .. } => None,
        })
        .ok_or_else(|| GeocodeError::Config {
            message: "no enabled IP location service".to_string(),
        })
}

/// Parses a `"lat"`/`"lon"` string pair the way geocoding APIs return them.
fn parse_point(lat: Option<&str>, lon: Option<&str>) -> Result<GeoPoint, GeocodeError> {
    let lat = lat
        .and_then(|s| s.trim().parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "missing or non-numeric latitude".to_string(),
        })?;
    let lon = lon
        .and_then(|s| s.trim().parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "missing or non-numeric longitude".to_string(),
        })?;

    GeoPoint::new(lat, lon).map_err(|e| GeocodeError::Parse {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_builds_both_collaborators() {
        let client = reqwest::Client::new();
        assert!(geocoder_from_registry(client.clone()).is_ok());
        assert!(ip_locator_from_registry(client).is_ok());
    }

    #[test]
    fn parse_point_rejects_out_of_range() {
        assert!(parse_point(Some("41.88"), Some("-87.62")).is_ok());
        assert!(parse_point(Some("141.88"), Some("-87.62")).is_err());
        assert!(parse_point(None, Some("-87.62")).is_err());
        assert!(parse_point(Some("abc"), Some("-87.62")).is_err());
    }
}
