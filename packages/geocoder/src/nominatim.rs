//! Nominatim / OpenStreetMap geocoder client.
//!
//! Forward lookups use the free-form `/search` endpoint; reverse lookups
//! use `/reverse` with address details. The public instance allows
//! **1 request per second** and requires an identifying `User-Agent`.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/> and
//! <https://nominatim.org/release-docs/develop/api/Reverse/>

use std::time::Duration;

use crime_insight_risk_models::{AddressInfo, GeoPoint};

use crate::service_registry::ProviderConfig;
use crate::{GeocodeError, Geocoder, parse_point};

/// Default reverse lookup timeout when the service config omits one.
pub const DEFAULT_REVERSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Address keys tried in order for the locality field.
///
/// Providers are inconsistent about which level they fill in, so the most
/// specific one present wins.
const LOCALITY_KEYS: &[&str] = &["suburb", "town", "city"];

/// Address keys tried in order for the district field.
const DISTRICT_KEYS: &[&str] = &["state_district", "county"];

/// Nominatim client implementing [`Geocoder`].
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    search_url: String,
    reverse_url: String,
    user_agent: String,
    language: String,
    reverse_timeout: Duration,
}

impl NominatimGeocoder {
    /// Creates a client from explicit endpoints.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        search_url: impl Into<String>,
        reverse_url: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            client,
            search_url: search_url.into(),
            reverse_url: reverse_url.into(),
            user_agent: user_agent.into(),
            language: "en".to_string(),
            reverse_timeout: DEFAULT_REVERSE_TIMEOUT,
        }
    }

    /// Creates a client from a `nominatim` service definition.
    ///
    /// Returns `None` for any other provider type.
    #[must_use]
    pub fn from_config(client: reqwest::Client, config: &ProviderConfig) -> Option<Self> {
        let ProviderConfig::Nominatim {
            search_url,
            reverse_url,
            user_agent,
            language,
            reverse_timeout_secs,
        } = config
        else {
            return None;
        };

        Some(Self {
            client,
            search_url: search_url.clone(),
            reverse_url: reverse_url.clone(),
            user_agent: user_agent.clone(),
            language: language.clone(),
            reverse_timeout: Duration::from_secs(*reverse_timeout_secs),
        })
    }
}

#[async_trait::async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let resp = self
            .client
            .get(&self.search_url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("limit", "1"),
                ("accept-language", self.language.as_str()),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.error_for_status()?.json().await?;
        parse_search_response(&body)
    }

    async fn reverse(&self, point: GeoPoint) -> Result<AddressInfo, GeocodeError> {
        let lat = point.latitude().to_string();
        let lon = point.longitude().to_string();

        let resp = self
            .client
            .get(&self.reverse_url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(self.reverse_timeout)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("accept-language", self.language.as_str()),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.error_for_status()?.json().await?;
        parse_reverse_response(&body)
    }
}

/// Parses a Nominatim `/search` response (a JSON array of places).
fn parse_search_response(body: &serde_json::Value) -> Result<Option<GeoPoint>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    parse_point(first["lat"].as_str(), first["lon"].as_str()).map(Some)
}

/// Parses a Nominatim `/reverse` response into an [`AddressInfo`].
fn parse_reverse_response(body: &serde_json::Value) -> Result<AddressInfo, GeocodeError> {
    if let Some(error) = body.get("error").and_then(serde_json::Value::as_str) {
        return Err(GeocodeError::Parse {
            message: format!("Nominatim reverse lookup failed: {error}"),
        });
    }

    let address = body
        .get("address")
        .and_then(serde_json::Value::as_object)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Nominatim reverse response missing 'address'".to_string(),
        })?;

    Ok(address_from_fields(address))
}

/// Builds an [`AddressInfo`] from a provider address object, applying the
/// locality and district fallback chains.
#[must_use]
pub fn address_from_fields(address: &serde_json::Map<String, serde_json::Value>) -> AddressInfo {
    let field = |key: &str| {
        address
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    let first_of = |keys: &[&str]| {
        keys.iter()
            .find_map(|&key| field(key))
            .unwrap_or_default()
            .to_string()
    };

    AddressInfo {
        country: field("country").unwrap_or_default().to_string(),
        state: field("state").unwrap_or_default().to_string(),
        district: first_of(DISTRICT_KEYS),
        locality: first_of(LOCALITY_KEYS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(value: &serde_json::Value) -> AddressInfo {
        address_from_fields(value.as_object().unwrap())
    }

    #[test]
    fn parses_search_result() {
        let body = serde_json::json!([{
            "lat": "28.6315",
            "lon": "77.2167",
            "display_name": "Connaught Place, New Delhi, Delhi, India"
        }]);
        let point = parse_search_response(&body).unwrap().unwrap();
        assert!((point.latitude() - 28.6315).abs() < 1e-4);
        assert!((point.longitude() - 77.2167).abs() < 1e-4);
    }

    #[test]
    fn parses_search_empty() {
        let body = serde_json::json!([]);
        assert!(parse_search_response(&body).unwrap().is_none());
    }

    #[test]
    fn rejects_non_array_search_body() {
        let body = serde_json::json!({"error": "bad request"});
        assert!(parse_search_response(&body).is_err());
    }

    #[test]
    fn parses_reverse_result() {
        let body = serde_json::json!({
            "display_name": "Saket, South Delhi, Delhi, India",
            "address": {
                "suburb": "Saket",
                "city": "New Delhi",
                "state_district": "South Delhi",
                "state": "Delhi",
                "country": "India",
                "country_code": "in"
            }
        });
        let info = parse_reverse_response(&body).unwrap();
        assert_eq!(info.country, "India");
        assert_eq!(info.state, "Delhi");
        assert_eq!(info.district, "South Delhi");
        assert_eq!(info.locality, "Saket");
    }

    #[test]
    fn reverse_error_body_is_an_error() {
        let body = serde_json::json!({"error": "Unable to geocode"});
        assert!(parse_reverse_response(&body).is_err());
    }

    #[test]
    fn locality_falls_back_to_town() {
        let info = address(&serde_json::json!({"town": "Buffalo", "city": "Erie"}));
        assert_eq!(info.locality, "Buffalo");
    }

    #[test]
    fn locality_falls_back_to_city() {
        let info = address(&serde_json::json!({"city": "Pune", "state": "Maharashtra"}));
        assert_eq!(info.locality, "Pune");
    }

    #[test]
    fn locality_empty_when_all_absent() {
        let info = address(&serde_json::json!({"country": "India"}));
        assert_eq!(info.locality, "");
        assert_eq!(info.district, "");
    }

    #[test]
    fn blank_suburb_is_skipped() {
        let info = address(&serde_json::json!({"suburb": "  ", "town": "Saket"}));
        assert_eq!(info.locality, "Saket");
    }

    #[test]
    fn district_falls_back_to_county() {
        let info = address(&serde_json::json!({"county": "Erie County"}));
        assert_eq!(info.district, "Erie County");
    }
}
