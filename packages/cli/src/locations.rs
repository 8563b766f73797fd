//! Compile-time registry of locations for the interactive picker.
//!
//! Countries, states, and cities are defined in `locations.toml` at the
//! crate root and embedded at compile time.

use serde::Deserialize;

/// The full country → state → city table.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationRegistry {
    /// Countries in display order.
    pub countries: Vec<Country>,
}

/// A country and its states.
#[derive(Debug, Clone, Deserialize)]
pub struct Country {
    /// Country name as sent to the geocoder.
    pub name: String,
    /// States in display order.
    pub states: Vec<State>,
}

/// A state and its cities.
#[derive(Debug, Clone, Deserialize)]
pub struct State {
    /// State name as sent to the geocoder.
    pub name: String,
    /// City or neighborhood names.
    pub cities: Vec<String>,
}

const LOCATIONS_TOML: &str = include_str!("../locations.toml");

/// Parses the embedded registry.
///
/// # Errors
///
/// Returns [`toml::de::Error`] if the embedded file is malformed.
pub fn registry() -> Result<LocationRegistry, toml::de::Error> {
    toml::from_str(LOCATIONS_TOML)
}

/// Builds the geocoder query for a picked entry.
#[must_use]
pub fn place_query(city: &str, state: &str, country: &str) -> String {
    format!("{city}, {state}, {country}")
}
