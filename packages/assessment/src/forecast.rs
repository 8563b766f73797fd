//! Crime count forecasting adapter.

use std::sync::Arc;

use chrono::NaiveDate;
use crime_insight_inference::{InferenceError, TrendModel};
use crime_insight_risk_models::ForecastPoint;

/// Turns raw trend predictions into [`ForecastPoint`]s.
#[derive(Clone)]
pub struct TrendForecaster {
    model: Arc<dyn TrendModel>,
}

impl std::fmt::Debug for TrendForecaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrendForecaster").finish_non_exhaustive()
    }
}

impl TrendForecaster {
    /// Wraps a loaded trend model.
    #[must_use]
    pub fn new(model: Arc<dyn TrendModel>) -> Self {
        Self { model }
    }

    /// Forecasts the crime count for `date`. The point estimate is
    /// truncated toward zero; the bounds are passed through unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] if the model cannot score the date.
    pub fn forecast(&self, date: NaiveDate) -> Result<ForecastPoint, InferenceError> {
        let prediction = self.model.predict(date)?;

        #[allow(clippy::cast_possible_truncation)]
        let predicted_count = prediction.yhat.trunc() as i64;

        log::debug!(
            "Forecast for {date}: {predicted_count} ({:.2} to {:.2})",
            prediction.lower,
            prediction.upper
        );

        Ok(ForecastPoint {
            date,
            predicted_count,
            lower_bound: prediction.lower,
            upper_bound: prediction.upper,
        })
    }
}
