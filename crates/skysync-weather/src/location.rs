//! Host geolocation capability.

use crate::types::{Coordinates, Location, LocationError};
use skysync_core::LocationConfig;
use std::future::Future;
use std::time::Duration;

/// Something that can report where the host is.
///
/// Implementations may be unsupported, refuse, or hang; callers bound them with
/// [`locate_with_timeout`].
pub trait Geolocator {
    fn locate(&self) -> impl Future<Output = Result<Location, LocationError>>;

    /// Whether a position can be asked for at all
    fn is_available(&self) -> bool {
        true
    }
}

/// Reports a fixed, configured position; without one, geolocation is unsupported.
#[derive(Debug, Clone, Default)]
pub struct StaticGeolocator {
    position: Option<Location>,
}

impl StaticGeolocator {
    pub fn new(position: Option<Location>) -> Self {
        Self { position }
    }

    pub fn unsupported() -> Self {
        Self { position: None }
    }

    /// Use the `[location]` home position, if configured
    pub fn from_config(config: &LocationConfig) -> Self {
        let position = config.home().map(|(lat, lon)| Location {
            coordinates: Coordinates::new(lat, lon),
            label: config.label.clone(),
        });
        Self { position }
    }
}

impl Geolocator for StaticGeolocator {
    async fn locate(&self) -> Result<Location, LocationError> {
        self.position.clone().ok_or(LocationError::Unsupported)
    }

    fn is_available(&self) -> bool {
        self.position.is_some()
    }
}

/// Ask `geolocator` for a position, treating anything slower than `timeout` as a failure.
pub async fn locate_with_timeout<G: Geolocator>(
    geolocator: &G,
    timeout: Duration,
) -> Result<Location, LocationError> {
    if !geolocator.is_available() {
        return Err(LocationError::Unsupported);
    }

    match tokio::time::timeout(timeout, geolocator.locate()).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Geolocation timed out after {:?}", timeout);
            Err(LocationError::Timeout)
        }
    }
}
