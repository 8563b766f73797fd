#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime insight API server binary.
//!
//! Loads the model artifacts named by `CRIME_TYPE_MODEL`,
//! `CRIME_TREND_MODEL`, and `RISK_ZONES_MODEL` and serves the API on
//! `BIND_ADDR:PORT`. Refuses to start if any artifact is unavailable.

use std::sync::Arc;

use crime_insight_assessment::RiskAssessmentService;
use crime_insight_assessment::config::ModelPaths;
use crime_insight_server::ServerConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let service = RiskAssessmentService::load(&ModelPaths::from_env()).map_err(|e| {
        log::error!("Failed to start: {e}");
        std::io::Error::other(e)
    })?;

    crime_insight_server::run_server(Arc::new(service), ServerConfig::from_env()).await
}
