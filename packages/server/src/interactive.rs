//! Interactive mode for the server.
//!
//! Prompts the user for bind address and port before starting the server.

use std::sync::Arc;

use crime_insight_assessment::RiskAssessmentService;
use dialoguer::{Confirm, Input};

use crate::ServerConfig;

/// Runs the server in interactive mode, prompting for configuration.
///
/// The prompts are pre-filled from `BIND_ADDR` and `PORT` (see
/// [`ServerConfig::from_env`]) and the chosen values are passed straight
/// to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if a prompt fails or the underlying
/// server fails to start.
#[allow(clippy::future_not_send)]
pub async fn run(service: Arc<RiskAssessmentService>) -> std::io::Result<()> {
    println!("Crime Insight Server");
    println!();

    let defaults = ServerConfig::from_env();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(defaults.bind_addr)
        .interact_text()
        .map_err(std::io::Error::other)?;

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(defaults.port)
        .interact_text()
        .map_err(std::io::Error::other)?;

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server(service, ServerConfig { bind_addr, port }).await
}
