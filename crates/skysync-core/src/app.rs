use anyhow::Result;

use crate::{Config, ConfigError, ValidationResult};

/// Main application state and lifecycle manager
pub struct App {
    config: Config,
    validation: ValidationResult,
}

impl App {
    /// Create a new application instance from the on-disk configuration
    pub fn new() -> Result<Self> {
        let (config, validation) = Config::load_validated()?;
        Ok(Self {
            config,
            validation,
        })
    }

    /// Create an application instance from an already-built configuration.
    ///
    /// Fails when the configuration has validation errors.
    pub fn from_config(config: Config) -> Result<Self> {
        let validation = config.validate();
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        Ok(Self {
            config,
            validation,
        })
    }

    /// Shutdown the application
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down SkySync");
        Ok(())
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Warnings collected while validating the configuration
    pub fn warnings(&self) -> &[crate::config::ConfigValidationError] {
        &self.validation.warnings
    }
}
