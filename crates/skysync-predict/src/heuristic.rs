//! Rule-based forecast from four atmospheric readings.
//!
//! The condition comes from a fixed decision tree over humidity and pressure, evaluated top to
//! bottom with strict comparisons:
//!
//! 1. humidity > 85 and pressure < 1005: Storm
//! 2. humidity > 70, or humidity > 50 and pressure < 1010: Rainy
//! 3. humidity > 40 or pressure < 1015: Cloudy
//! 4. otherwise Sunny
//!
//! Everything else is derived from that condition. Only the confidence is random.

use crate::types::{ConfidenceBand, PredictionInput, PredictionResult};
use rand::Rng;
use skysync_weather::Condition;
use std::fmt::Write;

const STORM_RAINFALL_MM: f64 = 25.4;
const RAIN_RAINFALL_MM: f64 = 8.2;

pub fn classify(humidity: f64, pressure: f64) -> Condition {
    if humidity > 85.0 && pressure < 1005.0 {
        Condition::Storm
    } else if humidity > 70.0 || (humidity > 50.0 && pressure < 1010.0) {
        Condition::Rainy
    } else if humidity > 40.0 || pressure < 1015.0 {
        Condition::Cloudy
    } else {
        Condition::Sunny
    }
}

/// Predict conditions for the next six hours.
pub fn predict<R: Rng>(
    input: &PredictionInput,
    rng: &mut R,
    band: ConfidenceBand,
) -> PredictionResult {
    let condition = classify(input.humidity, input.pressure);

    let temperature = input.temperature + if condition.is_wet() { -3.5 } else { 1.2 };

    // Rainy gains moisture and Storm keeps the reading; the dry conditions lose some.
    let humidity_shift = match condition {
        Condition::Rainy => 15.0,
        Condition::Storm => 0.0,
        _ => -5.0,
    };
    let humidity = (input.humidity + humidity_shift).clamp(0.0, 100.0);

    let rainfall = match condition {
        Condition::Storm => STORM_RAINFALL_MM,
        Condition::Rainy => RAIN_RAINFALL_MM,
        _ => 0.0,
    };

    let wind_speed = input.wind_speed * if condition == Condition::Storm { 2.5 } else { 1.1 };

    PredictionResult {
        temperature,
        humidity,
        rainfall,
        wind_speed,
        condition,
        confidence: rng.gen_range(band.min()..=band.max()),
        reasoning: build_reasoning(input, condition),
    }
}

/// Explain a prediction: one sentence per signal that fired plus a verdict,
/// or a single stable-conditions sentence when nothing stands out.
pub fn build_reasoning(input: &PredictionInput, condition: Condition) -> String {
    let mut clauses: Vec<String> = Vec::new();

    if input.pressure < 1010.0 {
        clauses.push(format!(
            "Pressure of {:.0} hPa points to an approaching low-pressure system.",
            input.pressure
        ));
    } else if input.pressure > 1020.0 {
        clauses.push(format!(
            "High pressure at {:.0} hPa favours sinking air and clearer skies.",
            input.pressure
        ));
    }

    if input.humidity > 70.0 {
        clauses.push(format!(
            "Humidity of {:.0}% keeps the lower atmosphere close to saturation.",
            input.humidity
        ));
    }

    if input.temperature > 28.0 && input.humidity > 60.0 {
        clauses.push(format!(
            "Warm, moist air at {:.1}°C adds convective instability.",
            input.temperature
        ));
    }

    let season = input.season.as_str().to_lowercase();
    if clauses.is_empty() {
        return format!(
            "Stable conditions with no strong pressure or moisture signal; {} is expected to \
             hold for the {} pattern.",
            condition.as_str().to_lowercase(),
            season
        );
    }

    let mut reasoning = clauses.join(" ");
    let _ = write!(
        reasoning,
        " Against a {} backdrop, the outlook for the next six hours is {}.",
        season,
        condition.as_str().to_lowercase()
    );
    reasoning
}
