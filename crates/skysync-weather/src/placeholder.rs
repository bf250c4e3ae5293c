//! Built-in series shown before the first successful fetch.

use crate::types::{Condition, CurrentConditions, Location, WeatherPoint, WeatherSnapshot};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::sync::OnceLock;

pub const PLACEHOLDER_LABEL: &str = "Awaiting first sync";

/// Default world view used when nothing better is known
pub const DEFAULT_LATITUDE: f64 = 20.0;
pub const DEFAULT_LONGITUDE: f64 = 0.0;

const HOURS: i64 = 24;

/// The shared placeholder snapshot. Deterministic, built once.
pub fn placeholder() -> &'static WeatherSnapshot {
    static PLACEHOLDER: OnceLock<WeatherSnapshot> = OnceLock::new();
    PLACEHOLDER.get_or_init(build)
}

/// True only for the shared placeholder instance
pub fn is_placeholder(snapshot: &WeatherSnapshot) -> bool {
    std::ptr::eq(snapshot, placeholder())
}

fn build() -> WeatherSnapshot {
    let midnight = NaiveDateTime::default();
    let points: Vec<WeatherPoint> = (0..HOURS)
        .map(|hour| {
            let h = hour as f64;
            WeatherPoint {
                timestamp: midnight + Duration::hours(hour),
                temperature: 23.0 + (h / 3.0).sin() * 5.0,
                humidity: 62.5 + (h / 4.0).cos() * 15.0,
                pressure: 1013.0,
                wind_speed: 5.0 + (hour % 5) as f64 * 1.5,
                rainfall: 0.0,
                condition: if !(6..=18).contains(&hour) {
                    Condition::Cloudy
                } else {
                    Condition::Sunny
                },
            }
        })
        .collect();

    let current = points
        .last()
        .map(|last| CurrentConditions {
            temperature: last.temperature,
            humidity: last.humidity,
            pressure: last.pressure,
            wind_speed: last.wind_speed,
            precipitation: last.rainfall,
            condition: last.condition,
        })
        .unwrap_or(CurrentConditions {
            temperature: 0.0,
            humidity: 0.0,
            pressure: 0.0,
            wind_speed: 0.0,
            precipitation: 0.0,
            condition: Condition::Cloudy,
        });

    WeatherSnapshot::new(
        current,
        Location::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE).with_label(PLACEHOLDER_LABEL),
        DateTime::<Utc>::default(),
        points,
    )
}
