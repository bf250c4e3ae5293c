mod cli;

use anyhow::{Context, Result};
use cli::{Args, Command, Target};
use skysync_core::{App, Config, WeatherError};
use skysync_predict::{PredictionEngine, PredictionResult};
use skysync_weather::{
    ControllerSettings, DisplaySource, Geocoder, Geolocator, HourlySummary, Location, MapSession,
    RefreshController, RefreshOutcome, StaticGeolocator, TickOutcome, TileLogger, WeatherProvider,
    WeatherSource,
};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();

    skysync_core::init_with_level(&args.log_level)?;

    let mut app = App::new()?;
    tracing::info!("SkySync started");

    let result = run(args.command, &app).await;

    app.shutdown()?;
    result
}

async fn run(command: Command, app: &App) -> Result<()> {
    let config = app.config();

    match command {
        Command::Now(args) => {
            let target = args.target().map_err(anyhow::Error::msg)?;
            now(config, target, args.map).await
        }
        Command::Watch(args) => {
            let target = args.target().map_err(anyhow::Error::msg)?;
            watch(config, target, !args.no_sync).await
        }
        Command::Search(args) => search(config, &args.query()).await,
        Command::Predict(args) => {
            let mut engine = PredictionEngine::new(&config.prediction);
            if args.instant {
                engine = engine.with_latency(Duration::ZERO);
            }
            let input = args.input();
            println!(
                "Running inference ({:.0}°C, {:.0}%, {:.0} hPa, {:.0} km/h, {})...",
                input.temperature, input.humidity, input.pressure, input.wind_speed, input.season
            );
            print_prediction(&engine.run(&input).await);
            Ok(())
        }
        Command::Analytics(args) => {
            let target = args.target().map_err(anyhow::Error::msg)?;
            analytics(config, target).await
        }
        Command::Config(_) => {
            print_config(app);
            Ok(())
        }
    }
}

/// Network-backed services shared by the fetching commands
struct Services {
    provider: WeatherProvider,
    geocoder: Geocoder,
    geolocator: StaticGeolocator,
    settings: ControllerSettings,
}

impl Services {
    fn from_config(config: &Config) -> Result<Self> {
        let geocoder = Geocoder::new(&config.geocoding).context("Failed to build geocoder")?;
        let provider = WeatherProvider::new(&config.weather)
            .context("Failed to build weather client")?
            .with_geocoder(geocoder.clone());

        Ok(Self {
            provider,
            geocoder,
            geolocator: StaticGeolocator::from_config(&config.location),
            settings: ControllerSettings::from_config(&config.refresh),
        })
    }

    /// Turn a target into a starting location. `Ok(None)` means use the host position.
    async fn starting_location(&self, target: Target) -> Result<Option<Location>> {
        match target {
            Target::Fixed(location) => Ok(Some(location)),
            Target::Host => Ok(None),
            Target::Query(query) => match self.geocoder.search(&query).await? {
                Some(hit) => Ok(Some(hit.into_location())),
                None => Err(WeatherError::LocationNotFound(query).into()),
            },
        }
    }

    fn controller(self) -> RefreshController<WeatherProvider, StaticGeolocator> {
        RefreshController::new(self.provider, self.geolocator, self.settings)
    }
}

/// Refresh once for `start` (host position when `None`), tracking it on success
async fn first_refresh<S: WeatherSource, G: Geolocator>(
    controller: &mut RefreshController<S, G>,
    start: Option<Location>,
) -> RefreshOutcome {
    match start {
        Some(location) => controller.set_location(location).await,
        None => controller.refresh(None).await,
    }
}

async fn now(config: &Config, target: Target, show_map: bool) -> Result<()> {
    let services = Services::from_config(config)?;
    let start = services.starting_location(target).await?;
    let mut controller = services.controller();

    let outcome = first_refresh(&mut controller, start).await;
    render(&controller);

    if show_map {
        let mut session = MapSession::new(TileLogger::default());
        session.show(controller.display().snapshot.coordinates());
    }

    if outcome == RefreshOutcome::Failed {
        anyhow::bail!(controller.error().unwrap_or("Refresh failed").to_string());
    }
    Ok(())
}

async fn watch(config: &Config, target: Target, auto_sync: bool) -> Result<()> {
    let services = Services::from_config(config)?;
    let start = services.starting_location(target).await?;
    let mut controller = services.controller();
    controller.toggle_auto_sync(auto_sync);

    first_refresh(&mut controller, start).await;
    render(&controller);

    let mut ticker = tokio::time::interval(Duration::from_millis(config.refresh.tick_millis));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match controller.tick().await {
                    TickOutcome::Due => render(&controller),
                    TickOutcome::Waiting(remaining) => {
                        tracing::debug!("Next refresh in {} ticks", remaining);
                    }
                    TickOutcome::Paused => {}
                }
            }
            result = &mut shutdown => {
                result.context("Failed to listen for Ctrl-C")?;
                tracing::info!("Received Ctrl-C, stopping watch");
                break;
            }
        }
    }

    Ok(())
}

async fn search(config: &Config, query: &str) -> Result<()> {
    let geocoder = Geocoder::new(&config.geocoding)?;

    match geocoder.search(query).await? {
        Some(hit) => println!(
            "{} ({:.4}, {:.4})",
            hit.label, hit.coordinates.latitude, hit.coordinates.longitude
        ),
        None => println!("No place matches \"{}\"", query.trim()),
    }
    Ok(())
}

async fn analytics(config: &Config, target: Target) -> Result<()> {
    let services = Services::from_config(config)?;
    let start = services.starting_location(target).await?;
    let mut controller = services.controller();

    if first_refresh(&mut controller, start).await == RefreshOutcome::Failed {
        if let Some(error) = controller.error() {
            eprintln!("warning: {}", error);
        }
    }

    let view = controller.display();
    let Some(summary) = HourlySummary::from_points(view.snapshot.hourly_forecast()) else {
        println!("No hourly data for {}", view.snapshot.location_label());
        return Ok(());
    };

    println!("{} ({} hours)", view.snapshot.location_label(), summary.samples);
    if view.is_placeholder() {
        println!("  showing sample data");
    }
    println!(
        "  Temperature  {:.1} to {:.1}°C, mean {:.1}°C",
        summary.min_temperature, summary.max_temperature, summary.mean_temperature
    );
    println!("  Humidity     mean {:.0}%", summary.mean_humidity);
    println!("  Rainfall     {:.1} mm total", summary.total_rainfall);
    println!(
        "  Peak wind    {:.1} km/h at {}",
        summary.peak_wind.1,
        summary.peak_wind.0.format("%H:%M")
    );
    match summary.temperature_humidity {
        Some(c) => println!(
            "  Temp/humidity correlation  {:+.2} ({})",
            c.coefficient, c.kind
        ),
        None => println!("  Temp/humidity correlation  n/a"),
    }
    let histogram: Vec<String> = summary
        .conditions
        .iter()
        .filter(|(_, hours)| *hours > 0)
        .map(|(condition, hours)| format!("{} {}h", condition, hours))
        .collect();
    println!(
        "  Conditions   {} (mostly {})",
        histogram.join(", "),
        summary.dominant_condition()
    );

    Ok(())
}

fn render<S: WeatherSource, G: Geolocator>(controller: &RefreshController<S, G>) {
    let view = controller.display();
    let snapshot = view.snapshot;

    let tag = match view.source {
        DisplaySource::Live => "",
        DisplaySource::Previous => " [stale]",
        DisplaySource::Placeholder => " [sample data]",
    };

    println!("{}{}", snapshot.location_label(), tag);
    println!(
        "  {}  {:.1}°C",
        snapshot.condition(),
        snapshot.temperature()
    );
    println!(
        "  humidity {:.0}%  pressure {:.0} hPa  wind {:.1} km/h  precipitation {:.1} mm",
        snapshot.humidity(),
        snapshot.pressure(),
        snapshot.wind_speed(),
        snapshot.precipitation()
    );
    if view.source != DisplaySource::Placeholder {
        println!("  updated {}", snapshot.timestamp().format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(error) = controller.error() {
        println!("  ! {}", error);
    }
    if controller.is_auto_sync_enabled() {
        println!("  next sync in {}s", controller.seconds_until_next_refresh());
    } else {
        println!("  auto-sync off");
    }
}

fn print_prediction(result: &PredictionResult) {
    println!("Next 6 hours: {}", result.condition);
    println!("  temperature {:.1}°C", result.temperature);
    println!("  humidity    {:.0}%", result.humidity);
    println!("  rainfall    {:.1} mm", result.rainfall);
    println!("  wind        {:.1} km/h", result.wind_speed);
    println!("  confidence  {:.0}%", result.confidence * 100.0);
    println!();
    println!("{}", result.reasoning);
}

fn print_config(app: &App) {
    match Config::config_path() {
        Ok(path) => println!("Config file: {}", path.display()),
        Err(e) => println!("Config file: unavailable ({})", e),
    }

    let config = app.config();
    println!("  forecast    {}", config.weather.forecast_url);
    println!("  geocoding   {}", config.geocoding.search_url);
    println!(
        "  auto-sync   {} every {} ticks of {} ms",
        if config.refresh.auto_sync { "on" } else { "off" },
        config.refresh.period_ticks,
        config.refresh.tick_millis
    );
    match config.location.home() {
        Some((lat, lon)) => println!("  home        {:.4}, {:.4}", lat, lon),
        None => println!("  home        not set (geolocation unsupported)"),
    }

    if app.warnings().is_empty() {
        println!("No warnings");
    } else {
        for warning in app.warnings() {
            println!("warning: {}", warning);
        }
    }
}
