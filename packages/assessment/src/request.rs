//! Assessment requests and their validation.
//!
//! An [`AssessmentRequest`] is the loose shape callers send: every field is
//! optional. Validation turns it into a [`ValidatedRequest`] with exactly
//! one location mode, a concrete hour, and a concrete forecast date, so the
//! service itself never branches on missing input.

use chrono::{Days, Local, NaiveDate, NaiveDateTime, Timelike as _};
use crime_insight_risk_models::GeoPoint;
use serde::{Deserialize, Serialize};

use crate::AssessmentError;

/// Raw assessment input as received from the HTTP API or the CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    /// Free-form place text (e.g. `"Saket, Delhi, India"`).
    #[serde(default)]
    pub place: Option<String>,
    /// Latitude of an explicit coordinate pair.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude of an explicit coordinate pair.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Locate the caller by IP address instead.
    #[serde(default)]
    pub use_current_location: bool,
    /// Hour of day (0-23). Defaults to the current local hour.
    #[serde(default)]
    pub hour: Option<i64>,
    /// Forecast date. Defaults to tomorrow.
    #[serde(default)]
    pub future_date: Option<NaiveDate>,
}

/// How the caller identified the location to assess.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Place text to forward geocode. Already trimmed and non-empty.
    Place(String),
    /// Explicit coordinates.
    Coordinates(GeoPoint),
    /// The caller's approximate position from IP geolocation.
    CurrentLocation,
}

impl std::fmt::Display for LocationInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Place(text) => write!(f, "place '{text}'"),
            Self::Coordinates(point) => write!(f, "coordinates ({point})"),
            Self::CurrentLocation => f.write_str("current location"),
        }
    }
}

/// A request with every default applied and every constraint checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    /// Location to assess.
    pub location: LocationInput,
    /// Hour of day, 0-23.
    pub hour: u8,
    /// Date to forecast.
    pub future_date: NaiveDate,
}

fn invalid(message: impl Into<String>) -> AssessmentError {
    AssessmentError::InvalidRequest {
        message: message.into(),
    }
}

impl AssessmentRequest {
    /// Extracts the single location mode from the request.
    ///
    /// # Errors
    ///
    /// Returns [`AssessmentError::InvalidRequest`] when no mode or more than
    /// one mode is given, when place text is blank, when only half of a
    /// coordinate pair is given, or when the coordinates are out of range.
    pub fn location_input(&self) -> Result<LocationInput, AssessmentError> {
        let mut modes = Vec::with_capacity(1);

        if let Some(place) = &self.place {
            let place = place.trim();
            if place.is_empty() {
                return Err(invalid("place must not be empty"));
            }
            modes.push(LocationInput::Place(place.to_string()));
        }

        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                let point =
                    GeoPoint::new(latitude, longitude).map_err(|e| invalid(e.to_string()))?;
                modes.push(LocationInput::Coordinates(point));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(invalid(
                    "latitude and longitude must be provided together",
                ));
            }
            (None, None) => {}
        }

        if self.use_current_location {
            modes.push(LocationInput::CurrentLocation);
        }

        match modes.len() {
            0 => Err(invalid(
                "a location is required: place, latitude/longitude, or useCurrentLocation",
            )),
            1 => Ok(modes.remove(0)),
            _ => Err(invalid(
                "only one of place, latitude/longitude, or useCurrentLocation may be given",
            )),
        }
    }

    /// Validates the request relative to `now`, which supplies the default
    /// hour and the default forecast date (the following day).
    ///
    /// # Errors
    ///
    /// Returns [`AssessmentError::InvalidRequest`] for an invalid location
    /// (see [`Self::location_input`]) or an hour outside 0-23.
    pub fn validate(&self, now: NaiveDateTime) -> Result<ValidatedRequest, AssessmentError> {
        let location = self.location_input()?;

        let hour = match self.hour {
            Some(hour) => u8::try_from(hour)
                .ok()
                .filter(|h| *h < 24)
                .ok_or_else(|| invalid(format!("hour must be between 0 and 23, got {hour}")))?,
            None => u8::try_from(now.hour()).unwrap_or_default(),
        };

        let future_date = match self.future_date {
            Some(date) => date,
            None => now
                .date()
                .checked_add_days(Days::new(1))
                .ok_or_else(|| invalid("no default forecast date after the maximum date"))?,
        };

        Ok(ValidatedRequest {
            location,
            hour,
            future_date,
        })
    }

    /// Validates the request against the current local time.
    ///
    /// # Errors
    ///
    /// See [`Self::validate`].
    pub fn validate_now(&self) -> Result<ValidatedRequest, AssessmentError> {
        self.validate(Local::now().naive_local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        "2025-03-14T21:45:00".parse().unwrap()
    }

    fn message(err: AssessmentError) -> String {
        match err {
            AssessmentError::InvalidRequest { message } => message,
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn place_is_trimmed_and_defaults_applied() {
        let request = AssessmentRequest {
            place: Some("  Saket, Delhi, India ".to_string()),
            ..Default::default()
        };
        let validated = request.validate(now()).unwrap();
        assert_eq!(
            validated.location,
            LocationInput::Place("Saket, Delhi, India".to_string())
        );
        assert_eq!(validated.hour, 21);
        assert_eq!(validated.future_date, "2025-03-15".parse().unwrap());
    }

    #[test]
    fn explicit_hour_and_date_are_kept() {
        let request = AssessmentRequest {
            latitude: Some(41.8827),
            longitude: Some(-87.6278),
            hour: Some(0),
            future_date: Some("2026-01-01".parse().unwrap()),
            ..Default::default()
        };
        let validated = request.validate(now()).unwrap();
        assert_eq!(validated.hour, 0);
        assert_eq!(validated.future_date, "2026-01-01".parse().unwrap());
        assert!(matches!(validated.location, LocationInput::Coordinates(_)));
    }

    #[test]
    fn current_location_mode() {
        let request = AssessmentRequest {
            use_current_location: true,
            ..Default::default()
        };
        assert_eq!(
            request.location_input().unwrap(),
            LocationInput::CurrentLocation
        );
    }

    #[test]
    fn missing_location_is_invalid() {
        let err = AssessmentRequest::default().validate(now()).unwrap_err();
        assert!(message(err).contains("location is required"));
    }

    #[test]
    fn blank_place_is_invalid() {
        let request = AssessmentRequest {
            place: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(message(request.validate(now()).unwrap_err()).contains("empty"));
    }

    #[test]
    fn half_coordinate_pair_is_invalid() {
        let request = AssessmentRequest {
            latitude: Some(28.6),
            ..Default::default()
        };
        assert!(message(request.validate(now()).unwrap_err()).contains("together"));
    }

    #[test]
    fn out_of_range_coordinates_are_invalid() {
        let request = AssessmentRequest {
            latitude: Some(123.0),
            longitude: Some(10.0),
            ..Default::default()
        };
        assert!(message(request.validate(now()).unwrap_err()).contains("invalid coordinates"));
    }

    #[test]
    fn multiple_modes_are_invalid() {
        let request = AssessmentRequest {
            place: Some("Mumbai".to_string()),
            use_current_location: true,
            ..Default::default()
        };
        assert!(message(request.validate(now()).unwrap_err()).contains("only one"));
    }

    #[test]
    fn hour_out_of_range_is_invalid() {
        for hour in [-1, 24, 1000] {
            let request = AssessmentRequest {
                use_current_location: true,
                hour: Some(hour),
                ..Default::default()
            };
            assert!(message(request.validate(now()).unwrap_err()).contains("hour"));
        }
    }

    #[test]
    fn deserializes_camel_case() {
        let request: AssessmentRequest = serde_json::from_value(serde_json::json!({
            "useCurrentLocation": true,
            "hour": 23,
            "futureDate": "2025-12-31"
        }))
        .unwrap();
        let validated = request.validate(now()).unwrap();
        assert_eq!(validated.location, LocationInput::CurrentLocation);
        assert_eq!(validated.hour, 23);
        assert_eq!(validated.future_date, "2025-12-31".parse().unwrap());
    }
}
