//! Location resolution: turns a [`LocationInput`] into coordinates plus a
//! human-readable address.

use std::sync::Arc;

use crime_insight_geocoder::{GeocodeError, Geocoder, IpLocator};
use crime_insight_risk_models::{AddressInfo, GeoPoint};
use thiserror::Error;

use crate::request::LocationInput;

/// Why a location could not be resolved. All variants are recoverable:
/// callers can fall back to asking for coordinates directly.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The geocoder had no match for the place text.
    #[error("No location found for '{query}'")]
    NotFound {
        /// The place text that was searched.
        query: String,
    },

    /// IP geolocation could not place the caller.
    #[error("Current location is unavailable")]
    LocationUnavailable,

    /// The geocoding service failed.
    #[error("Geocoding failed: {0}")]
    Geocoder(#[from] GeocodeError),
}

/// Resolves places, coordinates, and the caller's current position.
#[derive(Clone)]
pub struct LocationResolver {
    geocoder: Arc<dyn Geocoder>,
    ip_locator: Arc<dyn IpLocator>,
}

impl std::fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver").finish_non_exhaustive()
    }
}

impl LocationResolver {
    /// Creates a resolver over the given collaborators.
    #[must_use]
    pub fn new(geocoder: Arc<dyn Geocoder>, ip_locator: Arc<dyn IpLocator>) -> Self {
        Self {
            geocoder,
            ip_locator,
        }
    }

    /// Resolves `input` to a point and describes it.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] if the point itself cannot be found. A
    /// failed address lookup is not an error (see [`Self::describe`]).
    pub async fn resolve(
        &self,
        input: &LocationInput,
    ) -> Result<(GeoPoint, AddressInfo), ResolutionError> {
        let point = self.locate(input).await?;
        let address = self.describe(point).await;
        Ok((point, address))
    }

    /// Resolves `input` to a point without describing it.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::NotFound`] when place text has no match,
    /// [`ResolutionError::LocationUnavailable`] when IP geolocation returns
    /// nothing, and [`ResolutionError::Geocoder`] on transport failures.
    pub async fn locate(&self, input: &LocationInput) -> Result<GeoPoint, ResolutionError> {
        match input {
            LocationInput::Coordinates(point) => Ok(*point),
            LocationInput::Place(query) => {
                log::debug!("Geocoding '{query}'");
                self.geocoder
                    .geocode(query)
                    .await?
                    .ok_or_else(|| ResolutionError::NotFound {
                        query: query.clone(),
                    })
            }
            LocationInput::CurrentLocation => {
                log::debug!("Locating caller by IP");
                self.ip_locator
                    .locate()
                    .await?
                    .ok_or(ResolutionError::LocationUnavailable)
            }
        }
    }

    /// Reverse geocodes `point` into an address breakdown.
    ///
    /// Never fails: any geocoder error is logged and the empty breakdown is
    /// returned instead.
    pub async fn describe(&self, point: GeoPoint) -> AddressInfo {
        match self.geocoder.reverse(point).await {
            Ok(address) => address,
            Err(e) => {
                log::warn!("Reverse geocoding failed for ({point}): {e}");
                AddressInfo::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeGeocoder, FakeIpLocator};

    fn resolver(geocoder: FakeGeocoder, ip: FakeIpLocator) -> LocationResolver {
        LocationResolver::new(Arc::new(geocoder), Arc::new(ip))
    }

    #[tokio::test]
    async fn place_resolves_and_describes() {
        let resolver = resolver(FakeGeocoder::delhi(), FakeIpLocator::nowhere());
        let (point, address) = resolver
            .resolve(&LocationInput::Place("Saket, Delhi, India".to_string()))
            .await
            .unwrap();
        assert!((point.latitude() - 28.5245).abs() < 1e-9);
        assert_eq!(address.locality, "Saket");
        assert_eq!(address.country, "India");
    }

    #[tokio::test]
    async fn unknown_place_is_not_found() {
        let resolver = resolver(FakeGeocoder::delhi(), FakeIpLocator::nowhere());
        let err = resolver
            .resolve(&LocationInput::Place("Nonexistent Place, Nowhere".to_string()))
            .await
            .unwrap_err();
        match err {
            ResolutionError::NotFound { query } => {
                assert_eq!(query, "Nonexistent Place, Nowhere");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn coordinates_skip_forward_geocoding() {
        let resolver = resolver(FakeGeocoder::failing(), FakeIpLocator::nowhere());
        let point = GeoPoint::new(41.8827, -87.6278).unwrap();
        let (resolved, address) = resolver
            .resolve(&LocationInput::Coordinates(point))
            .await
            .unwrap();
        assert_eq!(resolved, point);
        assert!(address.is_empty());
    }

    #[tokio::test]
    async fn reverse_failure_fails_open() {
        let resolver = resolver(FakeGeocoder::failing(), FakeIpLocator::nowhere());
        let point = GeoPoint::new(28.6315, 77.2167).unwrap();
        assert_eq!(resolver.describe(point).await, AddressInfo::default());
    }

    #[tokio::test]
    async fn forward_transport_failure_is_a_geocoder_error() {
        let resolver = resolver(FakeGeocoder::failing(), FakeIpLocator::nowhere());
        let err = resolver
            .locate(&LocationInput::Place("Mumbai".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Geocoder(_)));
    }

    #[tokio::test]
    async fn current_location_uses_ip_locator() {
        let here = GeoPoint::new(19.076, 72.8777).unwrap();
        let resolver = resolver(FakeGeocoder::delhi(), FakeIpLocator::at(here));
        let point = resolver
            .locate(&LocationInput::CurrentLocation)
            .await
            .unwrap();
        assert_eq!(point, here);
    }

    #[tokio::test]
    async fn missing_ip_location_is_unavailable() {
        let resolver = resolver(FakeGeocoder::delhi(), FakeIpLocator::nowhere());
        let err = resolver
            .locate(&LocationInput::CurrentLocation)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::LocationUnavailable));
    }
}
