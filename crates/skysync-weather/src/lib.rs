//! Weather data for SkySync
//!
//! Fetches forecasts from Open-Meteo, resolves place names through Nominatim and keeps
//! an always-renderable dashboard view through the refresh controller.

pub mod analytics;
pub mod controller;
pub mod geocode;
pub mod location;
pub mod map;
pub mod placeholder;
pub mod provider;
pub mod types;

pub use analytics::{Correlation, CorrelationKind, HourlySummary};
pub use controller::{
    compute_display, AutoSync, ControllerSettings, DisplaySource, DisplayView, RefreshController,
    RefreshError, RefreshOutcome, RefreshTicket, TickOutcome, WeatherSource,
};
pub use geocode::{GeocodeMatch, Geocoder};
pub use location::{locate_with_timeout, Geolocator, StaticGeolocator};
pub use map::{tile_for, MapEvent, MapSession, MapWidget, Tile, TileLogger};
pub use placeholder::{is_placeholder, placeholder};
pub use provider::WeatherProvider;
pub use types::*;
