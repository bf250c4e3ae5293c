use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variables that override the configured home position.
pub const LATITUDE_ENV: &str = "SKYSYNC_LAT";
pub const LONGITUDE_ENV: &str = "SKYSYNC_LON";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Open-Meteo settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Nominatim settings
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Auto-sync countdown and geolocation timeout
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Home position reported as the host geolocation
    #[serde(default)]
    pub location: LocationConfig,

    /// Heuristic prediction engine tuning
    #[serde(default)]
    pub prediction: PredictionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Forecast endpoint
    pub forecast_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Forward geocoding endpoint
    pub search_url: String,

    /// Reverse geocoding endpoint
    pub reverse_url: String,

    /// Nominatim's usage policy requires an identifying user agent
    pub user_agent: String,

    /// Preferred language for place names
    pub language: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_geocoding_timeout")]
    pub request_timeout_secs: u64,
}

fn default_geocoding_timeout() -> u64 {
    10
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            search_url: "https://nominatim.openstreetmap.org/search".to_string(),
            reverse_url: "https://nominatim.openstreetmap.org/reverse".to_string(),
            user_agent: concat!("SkySync/", env!("CARGO_PKG_VERSION")).to_string(),
            language: "en".to_string(),
            request_timeout_secs: default_geocoding_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Ticks between automatic refreshes
    pub period_ticks: u32,

    /// Length of one countdown tick in milliseconds
    pub tick_millis: u64,

    /// Start with auto-sync enabled
    pub auto_sync: bool,

    /// Give up on geolocation after this many seconds
    pub geolocation_timeout_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            period_ticks: 5,
            tick_millis: 1000,
            auto_sync: true,
            geolocation_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub label: Option<String>,
}

impl LocationConfig {
    /// Home coordinates, only when both halves are configured.
    pub fn home(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Simulated inference latency in milliseconds
    pub latency_millis: u64,

    /// Lower bound of the confidence jitter band
    pub confidence_min: f64,

    /// Upper bound of the confidence jitter band
    pub confidence_max: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            latency_millis: 1200,
            confidence_min: 0.92,
            confidence_max: 0.97,
        }
    }
}

impl Config {
    /// Load configuration from the user config directory, creating a default file if missing.
    /// Position overrides from the environment are applied afterwards.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_position_override(
            std::env::var(LATITUDE_ENV).ok().as_deref(),
            std::env::var(LONGITUDE_ENV).ok().as_deref(),
        );
        Ok(config)
    }

    /// Load configuration from an explicit path, creating a default file if missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Replace the home position with `lat`/`lon` when both parse as numbers.
    pub fn apply_position_override(&mut self, lat: Option<&str>, lon: Option<&str>) {
        let (Some(lat), Some(lon)) = (lat, lon) else {
            return;
        };

        match (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
            (Ok(lat), Ok(lon)) => {
                tracing::debug!("Using position override {}, {}", lat, lon);
                self.location.latitude = Some(lat);
                self.location.longitude = Some(lon);
                self.location.label = None;
            }
            _ => {
                tracing::warn!(
                    "Ignoring unparseable position override {}={:?} {}={:?}",
                    LATITUDE_ENV,
                    lat,
                    LONGITUDE_ENV,
                    lon
                );
            }
        }
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.weather.forecast_url, "weather.forecast_url", &mut result);
        validate_url(&self.geocoding.search_url, "geocoding.search_url", &mut result);
        validate_url(&self.geocoding.reverse_url, "geocoding.reverse_url", &mut result);

        if self.weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.geocoding.user_agent.trim().is_empty() {
            result.add_error("geocoding.user_agent", "User agent must not be empty");
        }

        if self.refresh.period_ticks == 0 {
            result.add_error("refresh.period_ticks", "Refresh period must be at least 1 tick");
        } else if self.refresh.period_ticks > 3600 {
            result.add_warning(
                "refresh.period_ticks",
                "Refresh period is unusually long (>3600 ticks)",
            );
        }

        if self.refresh.tick_millis == 0 {
            result.add_error("refresh.tick_millis", "Tick length must be greater than 0");
        }

        if self.refresh.geolocation_timeout_secs == 0 {
            result.add_warning(
                "refresh.geolocation_timeout_secs",
                "Geolocation will time out immediately (0 seconds)",
            );
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location.latitude", "Latitude must be within [-90, 90]");
                }
                if !(-180.0..=180.0).contains(&lon) {
                    result.add_error(
                        "location.longitude",
                        "Longitude must be within [-180, 180]",
                    );
                }
            }
            (None, None) => {}
            _ => {
                result.add_warning(
                    "location",
                    "Only one of latitude/longitude is set; home position ignored",
                );
            }
        }

        let p = &self.prediction;
        for (field, value) in [
            ("prediction.confidence_min", p.confidence_min),
            ("prediction.confidence_max", p.confidence_max),
        ] {
            if !(0.0..=1.0).contains(&value) {
                result.add_error(field, "Confidence must be within [0, 1]");
            }
        }
        if p.confidence_min > p.confidence_max {
            result.add_error(
                "prediction.confidence_min",
                "Confidence minimum must not exceed the maximum",
            );
        }

        result
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skysync");

        Ok(config_dir.join("config.toml"))
    }
}

/// Validate a URL field
fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
