//! HTTP handler functions for the crime insight API.

use actix_web::{HttpResponse, web};
use chrono::{Local, Timelike as _};
use crime_insight_assessment::AssessmentError;
use crime_insight_assessment::location::ResolutionError;
use crime_insight_assessment::request::AssessmentRequest;
use crime_insight_assessment::risk;
use crime_insight_risk_models::CrimeType;
use crime_insight_server_models::{
    ApiAssessment, ApiCrimeType, ApiError, ApiHealth, ApiLocation, ApiTemporalRisk,
    ForecastParams, TemporalRiskParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/crime-types`
///
/// Returns the crime types the classifier can predict, in class id order.
pub async fn crime_types() -> HttpResponse {
    let types: Vec<ApiCrimeType> = CrimeType::labelled()
        .iter()
        .filter_map(|crime_type| {
            crime_type.class_id().map(|id| ApiCrimeType {
                id,
                code: *crime_type,
                name: crime_type.to_string(),
                advisory: crime_type.advisory().to_string(),
            })
        })
        .collect();

    HttpResponse::Ok().json(types)
}

/// `GET /api/temporal-risk?hour=H`
///
/// Temporal risk for an hour of day. Defaults to the current local hour.
pub async fn temporal_risk(params: web::Query<TemporalRiskParams>) -> HttpResponse {
    let hour = match params.hour {
        Some(hour) => match u8::try_from(hour).ok().filter(|h| *h < 24) {
            Some(hour) => hour,
            None => {
                return HttpResponse::BadRequest().json(ApiError::new(format!(
                    "hour must be between 0 and 23, got {hour}"
                )));
            }
        },
        None => u8::try_from(Local::now().hour()).unwrap_or_default(),
    };

    HttpResponse::Ok().json(ApiTemporalRisk::new(hour, risk::temporal_risk(hour)))
}

/// `GET /api/forecast?date=YYYY-MM-DD`
///
/// Crime count forecast for a date. Defaults to tomorrow.
pub async fn forecast(
    state: web::Data<AppState>,
    params: web::Query<ForecastParams>,
) -> HttpResponse {
    let Some(date) = params
        .date
        .or_else(|| Local::now().date_naive().succ_opt())
    else {
        return HttpResponse::BadRequest().json(ApiError::new("no forecast date available"));
    };

    match state.service.forecast(date) {
        Ok(point) => HttpResponse::Ok().json(point),
        Err(e) => {
            log::error!("Failed to forecast {date}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
    }
}

/// `POST /api/resolve`
///
/// Resolves a location without running any model. Takes the location
/// fields of an assessment request.
pub async fn resolve(
    state: web::Data<AppState>,
    body: web::Json<AssessmentRequest>,
) -> HttpResponse {
    let input = match body.location_input() {
        Ok(input) => input,
        Err(e) => return HttpResponse::BadRequest().json(ApiError::new(e.to_string())),
    };

    match state.service.resolve(&input).await {
        Ok((point, address)) => HttpResponse::Ok().json(ApiLocation::new(point, address)),
        Err(e) => resolution_error(&e, None),
    }
}

/// `POST /api/assess`
///
/// Runs a full assessment. Model failures are reported per field with
/// `"status": "failed"`; only invalid input or an unresolvable location
/// fail the whole request.
pub async fn assess(
    state: web::Data<AppState>,
    body: web::Json<AssessmentRequest>,
) -> HttpResponse {
    let request_id = uuid::Uuid::new_v4().to_string();

    let request = match body.validate_now() {
        Ok(request) => request,
        Err(e) => {
            log::info!("[{request_id}] Rejected assessment: {e}");
            return HttpResponse::BadRequest()
                .json(ApiError::new(e.to_string()).with_request_id(request_id));
        }
    };

    log::info!("[{request_id}] Assessing {}", request.location);

    match state.service.assess(&request).await {
        Ok(result) => {
            log::info!(
                "[{request_id}] Resolved to ({}), crime type ok={}, spatial ok={}, forecast ok={}",
                result.point,
                result.crime_type.is_ok(),
                result.spatial_risk.is_ok(),
                result.forecast.is_ok()
            );
            HttpResponse::Ok().json(ApiAssessment::new(request_id, result))
        }
        Err(AssessmentError::InvalidRequest { message }) => {
            HttpResponse::BadRequest().json(ApiError::new(message).with_request_id(request_id))
        }
        Err(AssessmentError::Resolution(e)) => {
            log::info!("[{request_id}] Could not resolve location: {e}");
            resolution_error(&e, Some(request_id))
        }
    }
}

/// Maps a [`ResolutionError`] to a response. Missing locations are `404`
/// with the manual coordinates hint; geocoder failures are `502`.
fn resolution_error(err: &ResolutionError, request_id: Option<String>) -> HttpResponse {
    let mut body = ApiError::new(err.to_string());
    if let Some(request_id) = request_id {
        body = body.with_request_id(request_id);
    }

    match err {
        ResolutionError::NotFound { .. } | ResolutionError::LocationUnavailable => {
            HttpResponse::NotFound().json(body.with_manual_coordinates())
        }
        ResolutionError::Geocoder(e) => {
            log::error!("Geocoding service failed: {e}");
            HttpResponse::BadGateway().json(body)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use crime_insight_assessment::RiskAssessmentService;
    use crime_insight_assessment::classifier::CrimeTypeClassifier;
    use crime_insight_assessment::forecast::TrendForecaster;
    use crime_insight_assessment::location::LocationResolver;
    use crime_insight_assessment::risk::RiskZoneEvaluator;
    use crime_insight_geocoder::{GeocodeError, Geocoder, IpLocator};
    use crime_insight_inference::forest::RandomForestModel;
    use crime_insight_inference::trend::AdditiveTrendModel;
    use crime_insight_risk_models::{AddressInfo, GeoPoint};
    use crime_insight_spatial::{
        CoreSample, FitSummary, RiskZoneArtifact, RiskZoneIndex, StandardScaler,
    };
    use serde_json::{Value, json};

    use crate::{AppState, configure};

    struct DelhiGeocoder;

    #[async_trait::async_trait]
    impl Geocoder for DelhiGeocoder {
        async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
            match query {
                "Connaught Place, Delhi, India" => Ok(Some(GeoPoint::new(28.6315, 77.2167).unwrap())),
                "Geocoder Outage" => Err(GeocodeError::RateLimited),
                _ => Ok(None),
            }
        }

        async fn reverse(&self, _point: GeoPoint) -> Result<AddressInfo, GeocodeError> {
            Ok(AddressInfo {
                country: "India".to_string(),
                state: "Delhi".to_string(),
                district: "New Delhi".to_string(),
                locality: "Connaught Place".to_string(),
            })
        }
    }

    struct NoIpLocation;

    #[async_trait::async_trait]
    impl IpLocator for NoIpLocation {
        async fn locate(&self) -> Result<Option<GeoPoint>, GeocodeError> {
            Ok(None)
        }
    }

    /// Real artifact-backed models: a single-leaf forest that always says
    /// Theft, a flat trend of 12.7 incidents, and one high-risk hotspot at
    /// Connaught Place.
    fn service() -> RiskAssessmentService {
        let forest = RandomForestModel::from_artifact(
            serde_json::from_value(json!({
                "classes": [0, 1, 2, 3, 4],
                "trees": [{"nodes": [{"kind": "leaf", "value": [0.0, 0.0, 0.0, 0.0, 1.0]}]}]
            }))
            .unwrap(),
        )
        .unwrap();

        let trend = AdditiveTrendModel::from_artifact(
            serde_json::from_value(json!({
                "start": "2024-01-01",
                "t_scale_days": 365.0,
                "y_scale": 1.0,
                "k": 0.0,
                "m": 12.7,
                "interval": {"lower": -2.5, "upper": 3.5}
            }))
            .unwrap(),
        )
        .unwrap();

        let zones = RiskZoneIndex::from_artifact(RiskZoneArtifact {
            eps: 0.5,
            min_samples: 5,
            scaler: StandardScaler {
                mean: [28.6, 77.2],
                scale: [0.05, 0.05],
            },
            core_samples: vec![CoreSample {
                latitude: 28.6315,
                longitude: 77.2167,
                cluster: 1,
            }],
            high_risk_clusters: vec![1],
            summary: FitSummary::default(),
        })
        .unwrap();

        RiskAssessmentService::new(
            LocationResolver::new(Arc::new(DelhiGeocoder), Arc::new(NoIpLocation)),
            CrimeTypeClassifier::new(Arc::new(forest)),
            RiskZoneEvaluator::new(Arc::new(zones)),
            TrendForecaster::new(Arc::new(trend)),
        )
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(actix_web::web::Data::new(AppState {
                        service: Arc::new(service()),
                    }))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn crime_types_lists_labelled_types() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/crime-types").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let types = body.as_array().unwrap();
        assert_eq!(types.len(), 5);
        assert_eq!(types[0]["code"], "ASSAULT");
        assert_eq!(types[4]["id"], 4);
    }

    #[actix_web::test]
    async fn temporal_risk_by_hour() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/temporal-risk?hour=23")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["risk"], "HIGH_RISK_TIME");
        assert_eq!(body["label"], "High Risk Time");

        let req = test::TestRequest::get()
            .uri("/api/temporal-risk?hour=12")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["risk"], "LOW_RISK");
    }

    #[actix_web::test]
    async fn temporal_risk_rejects_bad_hour() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/temporal-risk?hour=24")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/temporal-risk?hour=noon")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn forecast_for_date() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/forecast?date=2025-07-04")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["date"], "2025-07-04");
        assert_eq!(body["predictedCount"], 12);
        assert!((body["lowerBound"].as_f64().unwrap() - 10.2).abs() < 1e-9);
    }

    #[actix_web::test]
    async fn resolve_known_place() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/resolve")
            .set_json(json!({"place": "Connaught Place, Delhi, India"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!((body["latitude"].as_f64().unwrap() - 28.6315).abs() < 1e-9);
        assert_eq!(body["address"]["locality"], "Connaught Place");
    }

    #[actix_web::test]
    async fn resolve_unknown_place_suggests_manual_coordinates() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/resolve")
            .set_json(json!({"place": "Nonexistent Place, Nowhere"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["manualCoordinates"].is_object());
    }

    #[actix_web::test]
    async fn geocoder_failure_is_bad_gateway() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/resolve")
            .set_json(json!({"place": "Geocoder Outage"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn assess_place() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/assess")
            .set_json(json!({
                "place": "Connaught Place, Delhi, India",
                "hour": 22,
                "futureDate": "2025-07-04"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert!(!body["requestId"].as_str().unwrap().is_empty());
        assert_eq!(body["location"]["address"]["country"], "India");
        assert_eq!(body["crimeType"]["status"], "ok");
        assert_eq!(body["crimeType"]["value"]["code"], "THEFT");
        assert_eq!(body["spatialRisk"]["value"]["risk"], "HIGH_RISK_ZONE");
        assert_eq!(body["spatialRisk"]["value"]["cluster"], 1);
        assert_eq!(body["temporalRisk"]["risk"], "HIGH_RISK_TIME");
        assert_eq!(body["forecast"]["value"]["predictedCount"], 12);
    }

    #[actix_web::test]
    async fn assess_far_point_is_safe_zone() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/assess")
            .set_json(json!({"latitude": 19.076, "longitude": 72.8777, "hour": 10}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["spatialRisk"]["value"]["risk"], "SAFE_ZONE");
        assert!(body["spatialRisk"]["value"]["cluster"].is_null());
        assert_eq!(body["temporalRisk"]["risk"], "LOW_RISK");
    }

    #[actix_web::test]
    async fn assess_rejects_invalid_request() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/assess")
            .set_json(json!({"latitude": 28.6}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("together"));
    }

    #[actix_web::test]
    async fn assess_unavailable_current_location_is_not_found() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/assess")
            .set_json(json!({"useCurrentLocation": true}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn malformed_json_is_bad_request() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/assess")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }
}
