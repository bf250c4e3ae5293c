//! Command-line interface for skysync

use argh::FromArgs;
use skysync_predict::{PredictionInput, Season};
use skysync_weather::Location;

/// Live weather dashboard with auto-sync and heuristic forecasts
#[derive(FromArgs, Debug)]
pub struct Args {
    /// log level (error, warn, info, debug, trace)
    #[argh(option, short = 'l', default = "String::from(\"warn\")")]
    pub log_level: String,

    #[argh(subcommand)]
    pub command: Command,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
pub enum Command {
    Now(NowArgs),
    Watch(WatchArgs),
    Search(SearchArgs),
    Predict(PredictArgs),
    Analytics(AnalyticsArgs),
    Config(ConfigArgs),
}

/// fetch the weather once and print it
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "now")]
pub struct NowArgs {
    /// latitude in degrees (needs --lon)
    #[argh(option)]
    pub lat: Option<f64>,

    /// longitude in degrees (needs --lat)
    #[argh(option)]
    pub lon: Option<f64>,

    /// place name to search for instead of coordinates
    #[argh(option, short = 'q')]
    pub query: Option<String>,

    /// log the map tiles around the displayed location
    #[argh(switch)]
    pub map: bool,
}

/// keep the dashboard refreshed until Ctrl-C
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "watch")]
pub struct WatchArgs {
    /// latitude in degrees (needs --lon)
    #[argh(option)]
    pub lat: Option<f64>,

    /// longitude in degrees (needs --lat)
    #[argh(option)]
    pub lon: Option<f64>,

    /// place name to search for instead of coordinates
    #[argh(option, short = 'q')]
    pub query: Option<String>,

    /// start with auto-sync disabled
    #[argh(switch)]
    pub no_sync: bool,
}

/// look up a place by name
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "search")]
pub struct SearchArgs {
    /// free-text place name
    #[argh(positional)]
    pub query: Vec<String>,
}

/// run the heuristic forecast on manual readings
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "predict")]
pub struct PredictArgs {
    /// temperature in °C
    #[argh(option, default = "24.5")]
    pub temp: f64,

    /// relative humidity in percent
    #[argh(option, default = "65.0")]
    pub humidity: f64,

    /// pressure in hPa
    #[argh(option, default = "1013.0")]
    pub pressure: f64,

    /// wind speed in km/h
    #[argh(option, default = "12.0")]
    pub wind: f64,

    /// season: Summer, Winter, Monsoon or Spring/Autumn
    #[argh(option, default = "Season::Summer")]
    pub season: Season,

    /// skip the simulated inference delay
    #[argh(switch)]
    pub instant: bool,
}

/// summarize today's hourly forecast
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "analytics")]
pub struct AnalyticsArgs {
    /// latitude in degrees (needs --lon)
    #[argh(option)]
    pub lat: Option<f64>,

    /// longitude in degrees (needs --lat)
    #[argh(option)]
    pub lon: Option<f64>,

    /// place name to search for instead of coordinates
    #[argh(option, short = 'q')]
    pub query: Option<String>,
}

/// show the configuration file and its warnings
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "config")]
pub struct ConfigArgs {}

/// Where a command should get weather for
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Explicit coordinates
    Fixed(Location),
    /// Resolve a place name first
    Query(String),
    /// Ask the host for its position
    Host,
}

/// Combine the shared `--lat/--lon/--query` options
pub fn parse_target(
    lat: Option<f64>,
    lon: Option<f64>,
    query: Option<&str>,
) -> Result<Target, String> {
    let query = query.map(str::trim).filter(|q| !q.is_empty());

    match (lat, lon, query) {
        (Some(_), _, Some(_)) | (_, Some(_), Some(_)) => {
            Err("use either --query or --lat/--lon, not both".to_string())
        }
        (Some(lat), Some(lon), None) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(format!("coordinates out of range: {}, {}", lat, lon));
            }
            Ok(Target::Fixed(Location::new(lat, lon)))
        }
        (Some(_), None, None) | (None, Some(_), None) => {
            Err("--lat and --lon must be given together".to_string())
        }
        (None, None, Some(q)) => Ok(Target::Query(q.to_string())),
        (None, None, None) => Ok(Target::Host),
    }
}

impl NowArgs {
    pub fn target(&self) -> Result<Target, String> {
        parse_target(self.lat, self.lon, self.query.as_deref())
    }
}

impl WatchArgs {
    pub fn target(&self) -> Result<Target, String> {
        parse_target(self.lat, self.lon, self.query.as_deref())
    }
}

impl AnalyticsArgs {
    pub fn target(&self) -> Result<Target, String> {
        parse_target(self.lat, self.lon, self.query.as_deref())
    }
}

impl SearchArgs {
    pub fn query(&self) -> String {
        self.query.join(" ")
    }
}

impl PredictArgs {
    pub fn input(&self) -> PredictionInput {
        PredictionInput {
            temperature: self.temp,
            humidity: self.humidity,
            pressure: self.pressure,
            wind_speed: self.wind,
            season: self.season,
        }
    }
}
