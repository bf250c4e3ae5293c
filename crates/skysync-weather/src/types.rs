use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use skysync_core::{AppError, NetworkError, ReqwestErrorExt};
use std::fmt;
use std::str::FromStr;

/// Coarse weather categories shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Condition {
    Sunny,
    #[default]
    Cloudy,
    Rainy,
    Storm,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::Sunny,
        Condition::Cloudy,
        Condition::Rainy,
        Condition::Storm,
    ];

    /// Convert WMO weather code to Condition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Sunny,
            1..=3 => Self::Cloudy,
            c if c >= 95 => Self::Storm,
            51..=94 => Self::Rainy,
            _ => Self::Cloudy, // Fog, negative and unknown codes
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "Sunny",
            Self::Cloudy => "Cloudy",
            Self::Rainy => "Rainy",
            Self::Storm => "Storm",
        }
    }

    /// Precipitating conditions
    pub fn is_wet(&self) -> bool {
        matches!(self, Self::Rainy | Self::Storm)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown condition: {0}")]
pub struct ParseConditionError(String);

impl FromStr for Condition {
    type Err = ParseConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseConditionError(s.to_string()))
    }
}

/// A point on the globe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Label used when no place name can be resolved, e.g. "47.37°, 8.54°"
    pub fn fallback_label(&self) -> String {
        format!("{:.2}°, {:.2}°", self.latitude, self.longitude)
    }
}

/// Geographic location with an optional human-readable name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub coordinates: Coordinates,
    pub label: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coordinates: Coordinates::new(latitude, longitude),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.longitude
    }

    /// The label if resolved, otherwise the formatted coordinates
    pub fn display_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.coordinates.fallback_label())
    }
}

impl From<Coordinates> for Location {
    fn from(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            label: None,
        }
    }
}

/// One hourly sample of the forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPoint {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub rainfall: f64,
    pub condition: Condition,
}

/// Readings at fetch time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub condition: Condition,
}

/// Current readings plus the day's hourly forecast.
///
/// Snapshots never change after construction; a refresh produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    current: CurrentConditions,
    coordinates: Coordinates,
    location_label: String,
    timestamp: DateTime<Utc>,
    hourly_forecast: Vec<WeatherPoint>,
}

impl WeatherSnapshot {
    pub fn new(
        current: CurrentConditions,
        location: Location,
        timestamp: DateTime<Utc>,
        hourly_forecast: Vec<WeatherPoint>,
    ) -> Self {
        Self {
            location_label: location.display_label(),
            coordinates: location.coordinates,
            current,
            timestamp,
            hourly_forecast,
        }
    }

    pub fn current(&self) -> &CurrentConditions {
        &self.current
    }

    pub fn temperature(&self) -> f64 {
        self.current.temperature
    }

    pub fn humidity(&self) -> f64 {
        self.current.humidity
    }

    pub fn pressure(&self) -> f64 {
        self.current.pressure
    }

    pub fn wind_speed(&self) -> f64 {
        self.current.wind_speed
    }

    pub fn precipitation(&self) -> f64 {
        self.current.precipitation
    }

    pub fn condition(&self) -> Condition {
        self.current.condition
    }

    pub fn location_label(&self) -> &str {
        &self.location_label
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    /// The location this snapshot was fetched for, label included
    pub fn location(&self) -> Location {
        Location {
            coordinates: self.coordinates,
            label: Some(self.location_label.clone()),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Hourly samples in chronological order
    pub fn hourly_forecast(&self) -> &[WeatherPoint] {
        &self.hourly_forecast
    }
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Geolocation is not supported")]
    Unsupported,
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather API returned status {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Geocoding errors. An empty search result is not an error.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Geocoding service returned status {0}")]
    Status(u16),
    #[error("Invalid coordinates in geocoding result: {0}")]
    InvalidCoordinates(String),
}

impl From<&LocationError> for skysync_core::WeatherError {
    fn from(e: &LocationError) -> Self {
        match e {
            LocationError::Unsupported => skysync_core::WeatherError::GeolocationUnsupported,
            LocationError::Timeout => skysync_core::WeatherError::GeolocationTimeout,
            // Any other host refusal reads as a denied permission to the user
            LocationError::PermissionDenied | LocationError::Other(_) => {
                skysync_core::WeatherError::GeolocationDenied
            }
        }
    }
}

impl From<LocationError> for AppError {
    fn from(e: LocationError) -> Self {
        AppError::Weather((&e).into())
    }
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::Network(e) => AppError::Network(e.into_network_error()),
            WeatherError::Status(status) => AppError::Network(NetworkError::ServerError {
                status,
                message: "weather forecast request failed".to_string(),
            }),
            WeatherError::Parse(msg) => AppError::Network(NetworkError::InvalidResponse(msg)),
        }
    }
}

impl From<GeocodeError> for AppError {
    fn from(e: GeocodeError) -> Self {
        match e {
            GeocodeError::Network(e) => AppError::Network(e.into_network_error()),
            GeocodeError::Status(status) => AppError::Network(NetworkError::ServerError {
                status,
                message: "geocoding request failed".to_string(),
            }),
            GeocodeError::InvalidCoordinates(msg) => {
                AppError::Network(NetworkError::InvalidResponse(msg))
            }
        }
    }
}
