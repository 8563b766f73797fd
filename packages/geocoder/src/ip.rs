//! IP-based geolocation via an ipinfo.io-compatible endpoint.
//!
//! The response carries the position as a single `"loc": "lat,lon"`
//! string. Accuracy is city-level at best.

use crime_insight_risk_models::GeoPoint;

use crate::{GeocodeError, IpLocator, parse_point};

/// ipinfo.io client implementing [`IpLocator`].
#[derive(Debug, Clone)]
pub struct IpInfoLocator {
    client: reqwest::Client,
    base_url: String,
}

impl IpInfoLocator {
    /// Creates a locator against `base_url` (e.g. `https://ipinfo.io/json`).
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl IpLocator for IpInfoLocator {
    async fn locate(&self) -> Result<Option<GeoPoint>, GeocodeError> {
        let resp = self.client.get(&self.base_url).send().await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.error_for_status()?.json().await?;
        parse_response(&body)
    }
}

/// Parses the `loc` field. Bogon / private addresses come back without it.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeoPoint>, GeocodeError> {
    if body.get("bogon").and_then(serde_json::Value::as_bool) == Some(true) {
        return Ok(None);
    }

    let Some(loc) = body.get("loc").and_then(serde_json::Value::as_str) else {
        return Ok(None);
    };

    let mut parts = loc.splitn(2, ',');
    parse_point(parts.next(), parts.next()).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loc_field() {
        let body = serde_json::json!({
            "ip": "203.0.113.7",
            "city": "New Delhi",
            "loc": "28.6139,77.2090"
        });
        let point = parse_response(&body).unwrap().unwrap();
        assert!((point.latitude() - 28.6139).abs() < 1e-4);
        assert!((point.longitude() - 77.2090).abs() < 1e-4);
    }

    #[test]
    fn bogon_has_no_location() {
        let body = serde_json::json!({"ip": "10.0.0.1", "bogon": true});
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn malformed_loc_is_an_error() {
        let body = serde_json::json!({"loc": "north,west"});
        assert!(parse_response(&body).is_err());
    }
}
