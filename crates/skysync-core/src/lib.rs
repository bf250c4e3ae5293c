pub mod app;
pub mod config;
pub mod error;

pub use app::App;
pub use config::{
    Config, ConfigValidationError, GeocodingConfig, LocationConfig, PredictionConfig,
    RefreshConfig, ValidationResult, WeatherConfig,
};
pub use error::{AppError, ConfigError, NetworkError, ReqwestErrorExt, WeatherError};

use anyhow::Result;

/// Default log filter when neither `RUST_LOG` nor a CLI override is given.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Initialize the core application with the default log level
pub fn init() -> Result<()> {
    init_with_level(DEFAULT_LOG_LEVEL)
}

/// Initialize tracing/logging. `RUST_LOG` wins over `level` when set.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_with_level(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", level, e))?;

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
        return Ok(());
    }

    tracing::info!("SkySync core initialized");
    Ok(())
}
