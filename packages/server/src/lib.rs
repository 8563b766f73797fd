#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for crime risk assessments.
//!
//! Serves a small JSON API over a [`RiskAssessmentService`] that is loaded
//! once at startup and shared read-only by every worker. Each assessment
//! is tagged with a UUID request id that appears in both the response
//! and the log lines for that request.

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use crime_insight_assessment::RiskAssessmentService;
use crime_insight_server_models::ApiError;

/// Shared application state.
pub struct AppState {
    /// Assessment service with all models loaded.
    pub service: Arc<RiskAssessmentService>,
}

/// Where the HTTP server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: String,
    /// TCP port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR` and `PORT`, falling back to `127.0.0.1:8080`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        Self { bind_addr, port }
    }
}

/// Registers the `/api` routes and JSON error handling.
///
/// Malformed JSON bodies and query strings are answered with a `400` and
/// an [`ApiError`] body instead of actix's plain text default.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ApiError::new(err.to_string()));
        error::InternalError::from_response(err, response).into()
    });
    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ApiError::new(err.to_string()));
        error::InternalError::from_response(err, response).into()
    });

    cfg.app_data(json_config).app_data(query_config).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/crime-types", web::get().to(handlers::crime_types))
            .route("/temporal-risk", web::get().to(handlers::temporal_risk))
            .route("/forecast", web::get().to(handlers::forecast))
            .route("/resolve", web::post().to(handlers::resolve))
            .route("/assess", web::post().to(handlers::assess)),
    );
}

/// Starts the crime insight API server.
///
/// This is a regular async function; the caller is responsible for
/// providing the async runtime (e.g. via `#[actix_web::main]`) and for
/// initializing logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(
    service: Arc<RiskAssessmentService>,
    config: ServerConfig,
) -> std::io::Result<()> {
    let state = web::Data::new(AppState { service });

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}
