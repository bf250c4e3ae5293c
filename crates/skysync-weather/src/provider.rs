//! Open-Meteo forecast client.

use crate::controller::WeatherSource;
use crate::geocode::Geocoder;
use crate::types::{
    Condition, Coordinates, CurrentConditions, Location, WeatherError, WeatherPoint,
    WeatherSnapshot,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use skysync_core::WeatherConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Variables requested for both the current block and the hourly series
const FIELDS: &str =
    "temperature_2m,relative_humidity_2m,surface_pressure,wind_speed_10m,precipitation,weather_code";

/// Open-Meteo's local-time format for `timezone=auto`
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    hourly: HourlyBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    surface_pressure: f64,
    wind_speed_10m: f64,
    precipitation: f64,
    weather_code: i32,
}

/// Open-Meteo reports gaps in a series as `null`
#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    relative_humidity_2m: Vec<Option<f64>>,
    surface_pressure: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    weather_code: Vec<Option<i32>>,
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    geocoder: Option<Geocoder>,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Self::with_base_url(
            &config.forecast_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.to_string(),
            geocoder: None,
        })
    }

    /// Resolve labels for unnamed locations through `geocoder`
    pub fn with_geocoder(mut self, geocoder: Geocoder) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Fetch current conditions and today's hourly forecast for `location`.
    ///
    /// An unlabeled location is reverse geocoded while the forecast downloads;
    /// a failed lookup only costs the label, never the snapshot.
    #[instrument(skip(self, location), fields(lat = location.latitude(), lon = location.longitude()))]
    pub async fn fetch(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError> {
        let (forecast, label) = tokio::join!(
            self.fetch_forecast(&location.coordinates),
            self.resolve_label(location)
        );

        let snapshot = build_snapshot(forecast?, location.coordinates, label, Utc::now())?;
        tracing::info!(
            "Fetched weather for {}: {:.1}°C, {}",
            snapshot.location_label(),
            snapshot.temperature(),
            snapshot.condition()
        );
        Ok(snapshot)
    }

    async fn fetch_forecast(&self, coords: &Coordinates) -> Result<ForecastResponse, WeatherError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("current", FIELDS.to_string()),
                ("hourly", FIELDS.to_string()),
                ("forecast_days", "1".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!("Forecast request returned status {}", response.status());
            return Err(WeatherError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }

    async fn resolve_label(&self, location: &Location) -> String {
        if let Some(label) = &location.label {
            return label.clone();
        }

        match &self.geocoder {
            Some(geocoder) => geocoder.reverse(&location.coordinates).await,
            None => location.coordinates.fallback_label(),
        }
    }
}

impl WeatherSource for WeatherProvider {
    async fn fetch(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError> {
        WeatherProvider::fetch(self, location).await
    }
}

/// Zip the hourly arrays into points. Every series must be as long as `time`;
/// an hour with a `null` in any series is left out of the forecast.
fn build_snapshot(
    body: ForecastResponse,
    coordinates: Coordinates,
    label: String,
    fetched_at: DateTime<Utc>,
) -> Result<WeatherSnapshot, WeatherError> {
    let hourly = body.hourly;
    let len = hourly.time.len();

    for (name, series_len) in [
        ("temperature_2m", hourly.temperature_2m.len()),
        ("relative_humidity_2m", hourly.relative_humidity_2m.len()),
        ("surface_pressure", hourly.surface_pressure.len()),
        ("wind_speed_10m", hourly.wind_speed_10m.len()),
        ("precipitation", hourly.precipitation.len()),
        ("weather_code", hourly.weather_code.len()),
    ] {
        if series_len < len {
            return Err(WeatherError::Parse(format!(
                "hourly.{} has {} samples, expected {}",
                name, series_len, len
            )));
        }
    }

    let mut points = Vec::with_capacity(len);
    let mut gaps = 0;
    for (i, time) in hourly.time.iter().enumerate() {
        let timestamp = NaiveDateTime::parse_from_str(time, TIME_FORMAT)
            .map_err(|e| WeatherError::Parse(format!("bad hourly time {:?}: {}", time, e)))?;

        match (
            hourly.temperature_2m[i],
            hourly.relative_humidity_2m[i],
            hourly.surface_pressure[i],
            hourly.wind_speed_10m[i],
            hourly.precipitation[i],
            hourly.weather_code[i],
        ) {
            (
                Some(temperature),
                Some(humidity),
                Some(pressure),
                Some(wind_speed),
                Some(rainfall),
                Some(code),
            ) => points.push(WeatherPoint {
                timestamp,
                temperature,
                humidity,
                pressure,
                wind_speed,
                rainfall,
                condition: Condition::from_wmo_code(code),
            }),
            _ => gaps += 1,
        }
    }
    if gaps > 0 {
        tracing::debug!("Skipped {} of {} hourly samples with missing values", gaps, len);
    }

    let current = body.current;
    Ok(WeatherSnapshot::new(
        CurrentConditions {
            temperature: current.temperature_2m,
            humidity: current.relative_humidity_2m,
            pressure: current.surface_pressure,
            wind_speed: current.wind_speed_10m,
            precipitation: current.precipitation,
            condition: Condition::from_wmo_code(current.weather_code),
        },
        Location {
            coordinates,
            label: Some(label),
        },
        fetched_at,
        points,
    ))
}
