//! In-memory collaborators for service tests.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use crime_insight_geocoder::{GeocodeError, Geocoder, IpLocator};
use crime_insight_inference::{
    CrimeTypeModel, InferenceError, TrendModel, TrendPrediction, ZoneLookup, ZoneModel,
};
use crime_insight_risk_models::{AddressInfo, ClusterAssignment, FeatureVector, GeoPoint};

pub struct FakeGeocoder {
    places: BTreeMap<String, GeoPoint>,
    address: Option<AddressInfo>,
}

impl FakeGeocoder {
    pub fn delhi() -> Self {
        let mut places = BTreeMap::new();
        places.insert(
            "Saket, Delhi, India".to_string(),
            GeoPoint::new(28.5245, 77.2066).unwrap(),
        );
        places.insert(
            "Connaught Place, Delhi, India".to_string(),
            GeoPoint::new(28.6315, 77.2167).unwrap(),
        );
        Self {
            places,
            address: Some(AddressInfo {
                country: "India".to_string(),
                state: "Delhi".to_string(),
                district: "South Delhi".to_string(),
                locality: "Saket".to_string(),
            }),
        }
    }

    pub fn failing() -> Self {
        Self {
            places: BTreeMap::new(),
            address: None,
        }
    }
}

fn unreachable_service() -> GeocodeError {
    GeocodeError::Parse {
        message: "service unreachable".to_string(),
    }
}

#[async_trait::async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        if self.address.is_none() {
            return Err(unreachable_service());
        }
        Ok(self.places.get(query).copied())
    }

    async fn reverse(&self, _point: GeoPoint) -> Result<AddressInfo, GeocodeError> {
        self.address.clone().ok_or_else(unreachable_service)
    }
}

pub struct FakeIpLocator(Option<GeoPoint>);

impl FakeIpLocator {
    pub const fn at(point: GeoPoint) -> Self {
        Self(Some(point))
    }

    pub const fn nowhere() -> Self {
        Self(None)
    }
}

#[async_trait::async_trait]
impl IpLocator for FakeIpLocator {
    async fn locate(&self) -> Result<Option<GeoPoint>, GeocodeError> {
        Ok(self.0)
    }
}

/// Always predicts the same class id, or fails when `None`.
pub struct FixedClassifier(pub Option<i64>);

impl CrimeTypeModel for FixedClassifier {
    fn predict(&self, _features: &FeatureVector) -> Result<i64, InferenceError> {
        self.0.ok_or_else(|| InferenceError::Model {
            message: "classifier offline".to_string(),
        })
    }
}

/// Predicts `base + day of month`, or fails when `base` is `None`.
pub struct FixedTrend(pub Option<f64>);

impl TrendModel for FixedTrend {
    fn predict(&self, date: NaiveDate) -> Result<TrendPrediction, InferenceError> {
        use chrono::Datelike as _;

        let base = self.0.ok_or_else(|| InferenceError::NonFinitePrediction {
            input: date.to_string(),
        })?;
        let yhat = base + f64::from(date.day());
        Ok(TrendPrediction {
            yhat,
            lower: yhat - 4.0,
            upper: yhat + 6.0,
        })
    }
}

/// Assigns every point north of `split_latitude` to cluster 1 and
/// everything else to noise.
pub struct SplitZones {
    pub split_latitude: f64,
    pub high_risk: Vec<i32>,
}

impl ZoneModel for SplitZones {
    fn assign(&self, point: GeoPoint) -> Result<ZoneLookup, InferenceError> {
        Ok(if point.latitude() > self.split_latitude {
            ZoneLookup {
                assignment: ClusterAssignment::Cluster { id: 1 },
                nearest_core_distance_m: Some(120.0),
            }
        } else {
            ZoneLookup {
                assignment: ClusterAssignment::Noise,
                nearest_core_distance_m: Some(5_400.0),
            }
        })
    }

    fn high_risk_clusters(&self) -> &[i32] {
        &self.high_risk
    }
}
