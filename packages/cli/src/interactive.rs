//! Interactive mode: a menu-driven assessment flow using `dialoguer`.
//!
//! The assessment flow asks for a location (current position or a
//! country/state/city from [`crate::locations`]), an hour, and a forecast
//! date. If the location cannot be found it falls back to asking for
//! coordinates directly.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Days, Local, NaiveDate, Timelike as _};
use crime_insight_assessment::location::ResolutionError;
use crime_insight_assessment::request::{LocationInput, ValidatedRequest};
use crime_insight_assessment::{AssessmentError, AssessmentResult, RiskAssessmentService};
use crime_insight_cli_utils::{MultiProgress, spinner};
use crime_insight_risk_models::GeoPoint;
use crime_insight_spatial::fit::FitParams;
use dialoguer::{Confirm, Input, Select};

use crate::locations::{self, place_query};
use crate::report::Report;

/// Latitude offered when asking for manual coordinates.
const MANUAL_LATITUDE: f64 = 28.6139;
/// Longitude offered when asking for manual coordinates.
const MANUAL_LONGITUDE: f64 = 77.2090;

/// Top-level actions in the interactive menu.
enum Action {
    Assess,
    FitZones,
    Serve,
}

impl Action {
    const ALL: &[Self] = &[Self::Assess, Self::FitZones, Self::Serve];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Assess => "Assess a location",
            Self::FitZones => "Fit risk zones from incident data",
            Self::Serve => "Start API server",
        }
    }
}

/// How the user wants to pick a location.
enum LocationMode {
    Current,
    Registry,
}

impl LocationMode {
    const ALL: &[Self] = &[Self::Current, Self::Registry];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Current => "Use my current location",
            Self::Registry => "Choose a location",
        }
    }
}

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if a prompt fails, a model cannot be loaded, or the
/// selected operation fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Crime Insight");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Assess => handle_assess(multi).await?,
        Action::FitZones => handle_fit_zones(multi)?,
        Action::Serve => {
            let service = Arc::new(crate::load_service()?);
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new()
                    .block_on(crime_insight_server::interactive::run(service))
            })
            .await??;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_assess(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let service = crate::load_service()?;

    let location = prompt_location()?;
    let hour = prompt_hour()?;
    let future_date = prompt_date()?;

    let mut request = ValidatedRequest {
        location,
        hour,
        future_date,
    };

    let result = match assess(multi, &service, &request).await {
        Ok(result) => result,
        Err(AssessmentError::Resolution(
            e @ (ResolutionError::NotFound { .. } | ResolutionError::LocationUnavailable),
        )) => {
            println!("{e}. Enter coordinates manually.");
            request.location = LocationInput::Coordinates(prompt_coordinates()?);
            assess(multi, &service, &request).await?
        }
        Err(e) => return Err(e.into()),
    };

    println!();
    print!("{}", Report(&result));

    Ok(())
}

async fn assess(
    multi: &MultiProgress,
    service: &RiskAssessmentService,
    request: &ValidatedRequest,
) -> Result<AssessmentResult, AssessmentError> {
    let bar = spinner(multi, "Processing your request...");
    let result = service.assess(request).await;
    bar.finish_and_clear();
    result
}

fn handle_fit_zones(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let defaults = FitParams::default();

    let input: String = Input::new()
        .with_prompt("Incident CSV")
        .interact_text()?;

    let output: String = Input::new()
        .with_prompt("Output artifact")
        .default(
            crime_insight_assessment::config::ModelPaths::default()
                .risk_zones
                .display()
                .to_string(),
        )
        .interact_text()?;

    let eps: f64 = Input::new()
        .with_prompt("eps (standardized units)")
        .default(defaults.eps)
        .validate_with(|v: &f64| {
            if v.is_finite() && *v > 0.0 {
                Ok(())
            } else {
                Err("eps must be positive")
            }
        })
        .interact_text()?;

    let min_samples: usize = Input::new()
        .with_prompt("min_samples")
        .default(defaults.min_samples)
        .validate_with(|v: &usize| {
            if *v > 0 {
                Ok(())
            } else {
                Err("min_samples must be at least 1")
            }
        })
        .interact_text()?;

    let params = FitParams {
        eps,
        min_samples,
        ..defaults
    };

    let summary = crate::zones::fit_zones(
        multi,
        &PathBuf::from(input),
        &PathBuf::from(output),
        &params,
    )?;

    println!(
        "{} points: {} clusters, {} core samples, {} noise",
        summary.n_points, summary.n_clusters, summary.n_core, summary.n_noise
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

fn prompt_location() -> Result<LocationInput, Box<dyn std::error::Error>> {
    let labels: Vec<&str> = LocationMode::ALL.iter().map(LocationMode::label).collect();
    let idx = Select::new()
        .with_prompt("Location mode")
        .items(&labels)
        .default(0)
        .interact()?;

    match LocationMode::ALL[idx] {
        LocationMode::Current => Ok(LocationInput::CurrentLocation),
        LocationMode::Registry => {
            let registry = locations::registry()?;

            let names: Vec<&str> = registry.countries.iter().map(|c| c.name.as_str()).collect();
            let country = &registry.countries[Select::new()
                .with_prompt("Country")
                .items(&names)
                .default(0)
                .interact()?];

            let names: Vec<&str> = country.states.iter().map(|s| s.name.as_str()).collect();
            let state = &country.states[Select::new()
                .with_prompt("State")
                .items(&names)
                .default(0)
                .interact()?];

            let city = &state.cities[Select::new()
                .with_prompt("City")
                .items(&state.cities)
                .default(0)
                .interact()?];

            Ok(LocationInput::Place(place_query(
                city,
                &state.name,
                &country.name,
            )))
        }
    }
}

fn prompt_hour() -> Result<u8, Box<dyn std::error::Error>> {
    if Confirm::new()
        .with_prompt("Use current time?")
        .default(true)
        .interact()?
    {
        return Ok(u8::try_from(Local::now().hour())?);
    }

    Ok(Input::new()
        .with_prompt("Hour of day (0-23)")
        .default(12u8)
        .validate_with(|h: &u8| {
            if *h < 24 {
                Ok(())
            } else {
                Err("hour must be between 0 and 23")
            }
        })
        .interact_text()?)
}

fn prompt_date() -> Result<NaiveDate, Box<dyn std::error::Error>> {
    let today = Local::now().date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);

    Ok(Input::new()
        .with_prompt("Forecast date (YYYY-MM-DD)")
        .default(tomorrow)
        .interact_text()?)
}

fn prompt_coordinates() -> Result<GeoPoint, Box<dyn std::error::Error>> {
    let latitude: f64 = Input::new()
        .with_prompt("Latitude")
        .default(MANUAL_LATITUDE)
        .validate_with(|v: &f64| {
            if (-90.0..=90.0).contains(v) {
                Ok(())
            } else {
                Err("latitude must be between -90 and 90")
            }
        })
        .interact_text()?;

    let longitude: f64 = Input::new()
        .with_prompt("Longitude")
        .default(MANUAL_LONGITUDE)
        .validate_with(|v: &f64| {
            if (-180.0..=180.0).contains(v) {
                Ok(())
            } else {
                Err("longitude must be between -180 and 180")
            }
        })
        .interact_text()?;

    Ok(GeoPoint::new(latitude, longitude)?)
}
