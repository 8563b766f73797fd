#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line interface for crime risk assessments.
//!
//! ```text
//! crime_insight assess --place "Saket, Delhi, India" [--hour 22] [--date 2025-03-15]
//! crime_insight assess --latitude 28.6139 --longitude 77.2090
//! crime_insight assess --current-location
//! crime_insight fit-zones --input incidents.csv [--eps 0.5] [--min-samples 5]
//! crime_insight serve
//! ```
//!
//! Running with no subcommand enters interactive mode.
//!
//! Uses `indicatif-log-bridge` (via [`crime_insight_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod interactive;
mod locations;
mod report;
mod zones;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use crime_insight_assessment::config::ModelPaths;
use crime_insight_assessment::location::ResolutionError;
use crime_insight_assessment::request::AssessmentRequest;
use crime_insight_assessment::{AssessmentError, RiskAssessmentService, StartupError};
use crime_insight_server::ServerConfig;
use crime_insight_spatial::fit::FitParams;

use crate::report::Report;

#[derive(Parser)]
#[command(
    name = "crime_insight",
    about = "Predict crime type, risk zone, and crime trend for a location"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess a location
    Assess {
        /// Place to geocode (e.g. "Saket, Delhi, India")
        #[arg(long)]
        place: Option<String>,
        /// Latitude, used together with --longitude
        #[arg(long, allow_negative_numbers = true)]
        latitude: Option<f64>,
        /// Longitude, used together with --latitude
        #[arg(long, allow_negative_numbers = true)]
        longitude: Option<f64>,
        /// Locate this machine by IP address
        #[arg(long)]
        current_location: bool,
        /// Hour of day (0-23), defaults to the current hour
        #[arg(long, allow_negative_numbers = true)]
        hour: Option<i64>,
        /// Forecast date (YYYY-MM-DD), defaults to tomorrow
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Fit high-risk zones from a historical incident CSV
    FitZones {
        /// CSV with Latitude and Longitude columns
        #[arg(long)]
        input: PathBuf,
        /// Where to write the risk zone artifact
        #[arg(long, default_value = "models/high_risk_zones_model.json")]
        output: PathBuf,
        /// Neighborhood radius in standardized units
        #[arg(long, default_value_t = 0.5)]
        eps: f64,
        /// Minimum neighborhood size for a core sample
        #[arg(long, default_value_t = 5)]
        min_samples: usize,
        /// Cluster ids to flag as high risk
        #[arg(long, value_delimiter = ',', default_value = "1")]
        high_risk_clusters: Vec<i32>,
    },
    /// Start the API server on BIND_ADDR:PORT
    Serve,
}

/// Loads every model named by the environment.
///
/// # Errors
///
/// Returns [`StartupError`] if a model artifact is unavailable or no
/// geocoding service is configured.
fn load_service() -> Result<RiskAssessmentService, StartupError> {
    RiskAssessmentService::load(&ModelPaths::from_env())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = crime_insight_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi).await;
    };

    match command {
        Commands::Assess {
            place,
            latitude,
            longitude,
            current_location,
            hour,
            date,
        } => {
            let request = AssessmentRequest {
                place,
                latitude,
                longitude,
                use_current_location: current_location,
                hour,
                future_date: date,
            }
            .validate_now()?;

            let service = load_service()?;

            let bar = crime_insight_cli_utils::spinner(&multi, "Processing your request...");
            let result = service.assess(&request).await;
            bar.finish_and_clear();

            match result {
                Ok(result) => print!("{}", Report(&result)),
                Err(
                    e @ AssessmentError::Resolution(
                        ResolutionError::NotFound { .. } | ResolutionError::LocationUnavailable,
                    ),
                ) => {
                    eprintln!("Retry with --latitude and --longitude to enter coordinates manually.");
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::FitZones {
            input,
            output,
            eps,
            min_samples,
            high_risk_clusters,
        } => {
            let params = FitParams {
                eps,
                min_samples,
                high_risk_clusters,
            };
            let summary = zones::fit_zones(&multi, &input, &output, &params)?;
            println!(
                "{} points: {} clusters, {} core samples, {} noise",
                summary.n_points, summary.n_clusters, summary.n_core, summary.n_noise
            );
        }
        Commands::Serve => {
            let service = Arc::new(load_service()?);
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(crime_insight_server::run_server(
                    service,
                    ServerConfig::from_env(),
                ))
            })
            .await??;
        }
    }

    Ok(())
}
