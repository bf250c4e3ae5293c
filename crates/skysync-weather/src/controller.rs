//! Refresh controller: keeps an always-renderable weather view and decides when to re-fetch.
//!
//! The controller holds two snapshot slots. `current` is the latest successful fetch;
//! `previous` is whatever was current when the last refresh started. [`compute_display`]
//! derives the view from those slots so a fetch in flight, or a failed one, never blanks
//! the dashboard. The built-in placeholder only shows before any fetch has succeeded.
//!
//! Only one refresh is in flight at a time. A refresh is split into
//! [`RefreshController::begin_refresh`] and [`RefreshController::complete_refresh`];
//! asking to begin while a ticket is outstanding is a no-op reported as
//! [`RefreshOutcome::Skipped`]. A [`RefreshController::refresh`] future that is dropped
//! before it finishes gives its ticket back, so the controller never stays loading.

use crate::location::{locate_with_timeout, Geolocator};
use crate::placeholder::placeholder;
use crate::types::{Location, LocationError, WeatherError, WeatherSnapshot};
use skysync_core::RefreshConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Anything that can produce a snapshot for a location
pub trait WeatherSource {
    fn fetch(
        &self,
        location: &Location,
    ) -> impl Future<Output = Result<WeatherSnapshot, WeatherError>>;
}

/// Why a single refresh attempt failed. Never retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("geolocation failed: {0}")]
    Location(#[from] LocationError),
    #[error("weather fetch failed: {0}")]
    Fetch(#[from] WeatherError),
}

impl RefreshError {
    /// Message stored on the controller for the UI
    pub fn user_message(&self) -> &'static str {
        skysync_core::WeatherError::from(self).user_message()
    }
}

impl From<&RefreshError> for skysync_core::WeatherError {
    fn from(e: &RefreshError) -> Self {
        match e {
            RefreshError::Location(e) => e.into(),
            RefreshError::Fetch(e) => skysync_core::WeatherError::ApiError(e.to_string()),
        }
    }
}

/// Where the displayed snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplaySource {
    Live,
    Previous,
    Placeholder,
}

/// The snapshot a UI should render right now
#[derive(Debug, Clone, Copy)]
pub struct DisplayView<'a> {
    pub snapshot: &'a WeatherSnapshot,
    pub source: DisplaySource,
}

impl DisplayView<'_> {
    pub fn is_placeholder(&self) -> bool {
        self.source == DisplaySource::Placeholder
    }
}

/// Current if set, else previous if set, else the built-in placeholder.
pub fn compute_display<'a>(
    current: Option<&'a WeatherSnapshot>,
    previous: Option<&'a WeatherSnapshot>,
) -> DisplayView<'a> {
    match (current, previous) {
        (Some(snapshot), _) => DisplayView {
            snapshot,
            source: DisplaySource::Live,
        },
        (None, Some(snapshot)) => DisplayView {
            snapshot,
            source: DisplaySource::Previous,
        },
        (None, None) => DisplayView {
            snapshot: placeholder(),
            source: DisplaySource::Placeholder,
        },
    }
}

/// Result of one countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Auto-sync is off; nothing counted
    Paused,
    /// Still counting; ticks left until the next refresh
    Waiting(u32),
    /// Countdown hit zero; a refresh ran and the countdown restarted
    Due,
}

/// Auto-sync countdown: `Idle(n) -> Idle(n - 1)`, and at zero `Refreshing -> Idle(period)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSync {
    enabled: bool,
    period: u32,
    remaining: u32,
}

impl AutoSync {
    pub fn new(period: u32, enabled: bool) -> Self {
        let period = period.max(1);
        Self {
            enabled,
            period,
            remaining: period,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Enabling from off restarts the countdown at the full period.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled && !self.enabled {
            self.remaining = self.period;
        }
        self.enabled = enabled;
    }

    /// Restart the countdown at the full period
    pub fn reset(&mut self) {
        self.remaining = self.period;
    }

    /// Advance one tick. Returns `Due` when the countdown reaches zero, already reset.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.enabled {
            return TickOutcome::Paused;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.remaining = self.period;
            TickOutcome::Due
        } else {
            TickOutcome::Waiting(self.remaining)
        }
    }
}

/// Proof that a refresh was started; hand it back to `complete_refresh`.
#[derive(Debug)]
#[must_use = "complete or abandon the refresh, otherwise the controller stays loading"]
pub struct RefreshTicket {
    id: u64,
}

/// What a refresh request ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// `current` now holds a new snapshot
    Updated,
    /// The attempt failed; `error` is set and `current` is untouched
    Failed,
    /// Another refresh was already in flight; nothing happened
    Skipped,
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub period_ticks: u32,
    pub auto_sync: bool,
    pub geolocation_timeout: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&RefreshConfig::default())
    }
}

impl ControllerSettings {
    pub fn from_config(config: &RefreshConfig) -> Self {
        Self {
            period_ticks: config.period_ticks,
            auto_sync: config.auto_sync,
            geolocation_timeout: Duration::from_secs(config.geolocation_timeout_secs),
        }
    }
}

pub struct RefreshController<S, G> {
    source: S,
    geolocator: G,
    geolocation_timeout: Duration,
    current: Option<Arc<WeatherSnapshot>>,
    previous: Option<Arc<WeatherSnapshot>>,
    loading: bool,
    error: Option<String>,
    location: Option<Location>,
    auto_sync: AutoSync,
    in_flight: Option<u64>,
    next_ticket: u64,
}

impl<S: WeatherSource, G: Geolocator> RefreshController<S, G> {
    pub fn new(source: S, geolocator: G, settings: ControllerSettings) -> Self {
        Self {
            source,
            geolocator,
            geolocation_timeout: settings.geolocation_timeout,
            current: None,
            previous: None,
            loading: false,
            error: None,
            location: None,
            auto_sync: AutoSync::new(settings.period_ticks, settings.auto_sync),
            in_flight: None,
            next_ticket: 0,
        }
    }

    /// Fetch for `location`, or for the host's position when `None`.
    ///
    /// On failure the error message is stored and `current` stays as it was.
    pub async fn refresh(&mut self, location: Option<Location>) -> RefreshOutcome {
        let Some(ticket) = self.begin_refresh() else {
            return RefreshOutcome::Skipped;
        };

        let guard = InFlight {
            controller: self,
            ticket: Some(ticket),
        };
        let result = guard.controller.resolve_and_fetch(location).await;
        guard.finish(result)
    }

    /// Refresh for the tracked location, falling back to geolocation
    pub async fn refresh_tracked(&mut self) -> RefreshOutcome {
        let location = self.location.clone();
        self.refresh(location).await
    }

    /// Track `location` and refresh for it immediately
    pub async fn set_location(&mut self, location: Location) -> RefreshOutcome {
        tracing::info!("Location set to {}", location.display_label());
        self.location = Some(location.clone());
        self.refresh(Some(location)).await
    }

    /// Advance the auto-sync countdown, refreshing the tracked location when it runs out.
    /// A failed refresh still restarts the countdown at the full period.
    pub async fn tick(&mut self) -> TickOutcome {
        let outcome = self.auto_sync.tick();
        if outcome == TickOutcome::Due {
            tracing::debug!("Auto-sync countdown elapsed");
            self.refresh_tracked().await;
        }
        outcome
    }

    /// Start a refresh: the current snapshot moves into `previous`, `loading` is set,
    /// the error is cleared and the countdown restarts.
    ///
    /// Returns `None` while another refresh is still in flight.
    pub fn begin_refresh(&mut self) -> Option<RefreshTicket> {
        if self.loading {
            tracing::debug!("Refresh already in flight, ignoring request");
            return None;
        }

        if let Some(current) = &self.current {
            self.previous = Some(Arc::clone(current));
        }
        self.loading = true;
        self.error = None;
        self.auto_sync.reset();

        self.next_ticket += 1;
        self.in_flight = Some(self.next_ticket);
        Some(RefreshTicket {
            id: self.next_ticket,
        })
    }

    /// Finish the refresh identified by `ticket` with its result.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<WeatherSnapshot, RefreshError>,
    ) -> RefreshOutcome {
        if self.in_flight != Some(ticket.id) {
            tracing::warn!("Ignoring result for refresh {} that is not in flight", ticket.id);
            return RefreshOutcome::Skipped;
        }
        self.in_flight = None;
        self.loading = false;

        match result {
            Ok(snapshot) => {
                self.location = Some(snapshot.location());
                self.current = Some(Arc::new(snapshot));
                self.error = None;
                RefreshOutcome::Updated
            }
            Err(e) => {
                tracing::warn!("Refresh failed: {}", e);
                self.error = Some(e.user_message().to_string());
                RefreshOutcome::Failed
            }
        }
    }

    /// Give up on the refresh identified by `ticket` without touching the snapshots.
    /// `loading` clears and the next refresh may start.
    pub fn abandon_refresh(&mut self, ticket: RefreshTicket) {
        self.release(ticket);
    }

    async fn resolve_and_fetch(
        &self,
        location: Option<Location>,
    ) -> Result<WeatherSnapshot, RefreshError> {
        let location = match location {
            Some(location) => location,
            None => locate_with_timeout(&self.geolocator, self.geolocation_timeout).await?,
        };

        Ok(self.source.fetch(&location).await?)
    }

    /// What the UI should render now
    pub fn display(&self) -> DisplayView<'_> {
        compute_display(self.current.as_deref(), self.previous.as_deref())
    }

    /// Turn periodic refresh on or off. Turning it on restarts the countdown.
    pub fn toggle_auto_sync(&mut self, enabled: bool) {
        tracing::info!("Auto-sync {}", if enabled { "enabled" } else { "disabled" });
        self.auto_sync.set_enabled(enabled);
    }

    pub fn is_auto_sync_enabled(&self) -> bool {
        self.auto_sync.is_enabled()
    }

    /// Ticks left before the next automatic refresh; one tick is one second by default
    pub fn seconds_until_next_refresh(&self) -> u32 {
        self.auto_sync.remaining()
    }

    pub fn current(&self) -> Option<&Arc<WeatherSnapshot>> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&Arc<WeatherSnapshot>> {
        self.previous.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

impl<S, G> RefreshController<S, G> {
    fn release(&mut self, ticket: RefreshTicket) {
        if self.in_flight == Some(ticket.id) {
            tracing::debug!("Refresh {} abandoned", ticket.id);
            self.in_flight = None;
            self.loading = false;
        }
    }
}

/// Holds the ticket of a running `refresh` and releases it if the future is dropped early
struct InFlight<'a, S, G> {
    controller: &'a mut RefreshController<S, G>,
    ticket: Option<RefreshTicket>,
}

impl<S: WeatherSource, G: Geolocator> InFlight<'_, S, G> {
    fn finish(mut self, result: Result<WeatherSnapshot, RefreshError>) -> RefreshOutcome {
        match self.ticket.take() {
            Some(ticket) => self.controller.complete_refresh(ticket, result),
            None => RefreshOutcome::Skipped,
        }
    }
}

impl<S, G> Drop for InFlight<'_, S, G> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.controller.release(ticket);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::StaticGeolocator;
    use crate::types::{Condition, Coordinates, CurrentConditions};
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn snapshot(temperature: f64, location: &Location) -> WeatherSnapshot {
        WeatherSnapshot::new(
            CurrentConditions {
                temperature,
                humidity: 55.0,
                pressure: 1012.0,
                wind_speed: 7.0,
                precipitation: 0.0,
                condition: Condition::Cloudy,
            },
            location.clone().with_label(
                location
                    .label
                    .clone()
                    .unwrap_or_else(|| "Resolved Place".to_string()),
            ),
            Utc::now(),
            Vec::new(),
        )
    }

    /// Scripted source: pops one temperature (or failure) per fetch
    #[derive(Default)]
    struct Scripted {
        replies: Mutex<VecDeque<Option<f64>>>,
        requested: Mutex<Vec<Location>>,
    }

    impl Scripted {
        fn new(replies: &[Option<f64>]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().copied().collect()),
                requested: Mutex::default(),
            }
        }

        fn requested(&self) -> Vec<Location> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl WeatherSource for Scripted {
        async fn fetch(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError> {
            self.requested.lock().unwrap().push(location.clone());
            match self.replies.lock().unwrap().pop_front().flatten() {
                Some(temp) => Ok(snapshot(temp, location)),
                None => Err(WeatherError::Status(500)),
            }
        }
    }

    impl WeatherSource for &Scripted {
        async fn fetch(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError> {
            (**self).fetch(location).await
        }
    }

    fn zurich() -> Location {
        Location::new(47.37, 8.54)
    }

    fn controller(
        replies: &[Option<f64>],
        geolocator: StaticGeolocator,
    ) -> RefreshController<Scripted, StaticGeolocator> {
        RefreshController::new(Scripted::new(replies), geolocator, ControllerSettings::default())
    }

    #[test]
    fn test_compute_display_priority() {
        let a = snapshot(1.0, &zurich());
        let b = snapshot(2.0, &zurich());

        let view = compute_display(Some(&a), Some(&b));
        assert_eq!(view.source, DisplaySource::Live);
        assert_eq!(view.snapshot.temperature(), 1.0);

        let view = compute_display(None, Some(&b));
        assert_eq!(view.source, DisplaySource::Previous);
        assert_eq!(view.snapshot.temperature(), 2.0);

        let view = compute_display(None, None);
        assert!(view.is_placeholder());
        assert!(crate::placeholder::is_placeholder(view.snapshot));
    }

    #[tokio::test]
    async fn test_placeholder_before_first_fetch() {
        let c = controller(&[], StaticGeolocator::unsupported());
        assert!(c.display().is_placeholder());
        assert!(!c.is_loading());
        assert!(c.error().is_none());
    }

    #[tokio::test]
    async fn test_successful_refresh_replaces_current() {
        let mut c = controller(&[Some(21.0)], StaticGeolocator::unsupported());

        let outcome = c.refresh(Some(zurich())).await;

        assert_eq!(outcome, RefreshOutcome::Updated);
        assert_eq!(c.current().unwrap().temperature(), 21.0);
        assert!(c.previous().is_none());
        assert!(!c.is_loading());
        assert!(c.error().is_none());
        assert_eq!(c.display().source, DisplaySource::Live);
    }

    #[tokio::test]
    async fn test_refresh_moves_current_into_previous() {
        let mut c = controller(&[Some(21.0), Some(22.5)], StaticGeolocator::unsupported());
        c.refresh(Some(zurich())).await;
        let first = Arc::clone(c.current().unwrap());

        c.refresh(Some(zurich())).await;

        assert!(Arc::ptr_eq(c.previous().unwrap(), &first));
        assert_eq!(c.current().unwrap().temperature(), 22.5);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_current() {
        let mut c = controller(&[Some(21.0), None], StaticGeolocator::unsupported());
        c.refresh(Some(zurich())).await;
        let before = Arc::clone(c.current().unwrap());

        let outcome = c.refresh(Some(zurich())).await;

        assert_eq!(outcome, RefreshOutcome::Failed);
        assert_eq!(c.error(), Some("Failed to fetch weather data"));
        assert!(Arc::ptr_eq(c.current().unwrap(), &before));
        assert!(!c.is_loading());
        assert_eq!(c.display().snapshot.temperature(), 21.0);
    }

    #[tokio::test]
    async fn test_failure_before_any_data_shows_placeholder() {
        let mut c = controller(&[None], StaticGeolocator::unsupported());
        assert_eq!(c.refresh(Some(zurich())).await, RefreshOutcome::Failed);
        assert!(c.display().is_placeholder());
    }

    #[tokio::test]
    async fn test_never_placeholder_after_success() {
        let mut c = controller(
            &[Some(20.0), None, Some(19.0), None, None],
            StaticGeolocator::unsupported(),
        );
        let mut seen_success = false;
        for _ in 0..5 {
            if c.refresh(Some(zurich())).await == RefreshOutcome::Updated {
                seen_success = true;
            }
            if seen_success {
                assert!(!c.display().is_placeholder());
            }
        }
        assert!(seen_success);
    }

    #[tokio::test]
    async fn test_success_clears_previous_error() {
        let mut c = controller(&[None, Some(18.0)], StaticGeolocator::unsupported());
        c.refresh(Some(zurich())).await;
        assert!(c.error().is_some());

        c.refresh(Some(zurich())).await;
        assert!(c.error().is_none());
    }

    #[tokio::test]
    async fn test_geolocation_unsupported() {
        let mut c = controller(&[Some(20.0)], StaticGeolocator::unsupported());

        let outcome = c.refresh(None).await;

        assert_eq!(outcome, RefreshOutcome::Failed);
        assert_eq!(c.error(), Some("Geolocation is not supported"));
        assert!(c.current().is_none());
        assert!(c.source.requested().is_empty());
    }

    #[tokio::test]
    async fn test_geolocation_supplies_position() {
        let mut c = controller(&[Some(20.0)], StaticGeolocator::new(Some(zurich())));

        assert_eq!(c.refresh(None).await, RefreshOutcome::Updated);
        assert_eq!(c.source.requested()[0].coordinates, Coordinates::new(47.37, 8.54));
    }

    struct Denied;

    impl Geolocator for Denied {
        async fn locate(&self) -> Result<Location, LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    struct Hanging;

    impl Geolocator for Hanging {
        async fn locate(&self) -> Result<Location, LocationError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_geolocation_denied() {
        let mut c =
            RefreshController::new(Scripted::new(&[]), Denied, ControllerSettings::default());
        c.refresh(None).await;
        assert_eq!(c.error(), Some("Location permission denied"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_geolocation_timeout_is_a_failure() {
        let mut c =
            RefreshController::new(Scripted::new(&[]), Hanging, ControllerSettings::default());
        assert_eq!(c.refresh(None).await, RefreshOutcome::Failed);
        assert_eq!(c.error(), Some("Location request timed out"));
        assert!(!c.is_loading());
    }

    #[tokio::test]
    async fn test_success_tracks_resolved_location() {
        let mut c = controller(&[Some(20.0)], StaticGeolocator::new(Some(zurich())));
        c.refresh(None).await;
        let tracked = c.location().unwrap();
        assert_eq!(tracked.coordinates, zurich().coordinates);
        assert_eq!(tracked.label.as_deref(), Some("Resolved Place"));
    }

    #[tokio::test]
    async fn test_set_location_fetches_immediately() {
        let mut c = controller(&[Some(25.0)], StaticGeolocator::unsupported());
        let paris = Location::new(48.85, 2.35).with_label("Paris, France");

        assert_eq!(c.set_location(paris.clone()).await, RefreshOutcome::Updated);
        assert_eq!(c.source.requested(), vec![paris.clone()]);
        assert_eq!(c.location(), Some(&paris));
        assert_eq!(c.display().snapshot.location_label(), "Paris, France");
    }

    #[tokio::test]
    async fn test_set_location_is_tracked_even_if_fetch_fails() {
        let mut c = controller(&[None], StaticGeolocator::unsupported());
        let paris = Location::new(48.85, 2.35);
        c.set_location(paris.clone()).await;
        assert_eq!(c.location(), Some(&paris));
    }

    #[test]
    fn test_overlapping_refresh_is_skipped() {
        let mut c = controller(&[], StaticGeolocator::unsupported());

        let first = c.begin_refresh().expect("first refresh starts");
        assert!(c.is_loading());
        assert!(c.begin_refresh().is_none());

        let outcome = c.complete_refresh(first, Ok(snapshot(30.0, &zurich())));
        assert_eq!(outcome, RefreshOutcome::Updated);
        assert!(!c.is_loading());
        assert_eq!(c.current().unwrap().temperature(), 30.0);

        assert!(c.begin_refresh().is_some());
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut c = controller(&[], StaticGeolocator::unsupported());
        let _live = c.begin_refresh().unwrap();
        let stale = RefreshTicket { id: 99 };

        assert_eq!(
            c.complete_refresh(stale, Ok(snapshot(1.0, &zurich()))),
            RefreshOutcome::Skipped
        );
        assert!(c.is_loading());
        assert!(c.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_refresh_releases_controller() {
        let mut c = RefreshController::new(
            Scripted::new(&[Some(17.0)]),
            Hanging,
            ControllerSettings::default(),
        );

        // The geolocation timeout is 10s, so the outer 1s timeout drops the refresh first
        let cancelled = tokio::time::timeout(Duration::from_secs(1), c.refresh(None)).await;
        assert!(cancelled.is_err());
        assert!(!c.is_loading());
        assert!(c.error().is_none());

        assert_eq!(c.refresh(Some(zurich())).await, RefreshOutcome::Updated);
        assert_eq!(c.current().unwrap().temperature(), 17.0);
    }

    #[test]
    fn test_abandoned_ticket_frees_the_slot() {
        let mut c = controller(&[], StaticGeolocator::unsupported());
        let t = c.begin_refresh().unwrap();
        c.complete_refresh(t, Ok(snapshot(12.0, &zurich())));

        let abandoned = c.begin_refresh().unwrap();
        c.abandon_refresh(abandoned);
        assert!(!c.is_loading());
        assert_eq!(c.current().unwrap().temperature(), 12.0);
        assert!(c.begin_refresh().is_some());
    }

    #[test]
    fn test_begin_refresh_snapshots_current_into_previous() {
        let mut c = controller(&[], StaticGeolocator::unsupported());
        let t = c.begin_refresh().unwrap();
        c.complete_refresh(t, Ok(snapshot(10.0, &zurich())));

        let _t = c.begin_refresh().unwrap();
        assert!(c.is_loading());
        assert_eq!(c.previous().unwrap().temperature(), 10.0);
        // Still rendering the live value while the request is out
        assert_eq!(c.display().snapshot.temperature(), 10.0);
    }

    #[test]
    fn test_autosync_counts_down_and_resets() {
        let mut sync = AutoSync::new(5, true);
        assert_eq!(sync.tick(), TickOutcome::Waiting(4));
        assert_eq!(sync.tick(), TickOutcome::Waiting(3));
        assert_eq!(sync.tick(), TickOutcome::Waiting(2));
        assert_eq!(sync.tick(), TickOutcome::Waiting(1));
        assert_eq!(sync.tick(), TickOutcome::Due);
        assert_eq!(sync.remaining(), 5);
    }

    #[test]
    fn test_autosync_disabled_ignores_ticks() {
        let mut sync = AutoSync::new(5, true);
        sync.tick();
        sync.set_enabled(false);
        assert_eq!(sync.tick(), TickOutcome::Paused);
        assert_eq!(sync.remaining(), 4);
    }

    #[test]
    fn test_autosync_toggle_restarts_full_period() {
        let mut sync = AutoSync::new(5, true);
        sync.tick();
        sync.tick();
        assert_eq!(sync.remaining(), 3);

        sync.set_enabled(false);
        sync.set_enabled(true);
        assert_eq!(sync.remaining(), 5);
    }

    #[test]
    fn test_autosync_zero_period_is_clamped() {
        let mut sync = AutoSync::new(0, true);
        assert_eq!(sync.period(), 1);
        assert_eq!(sync.tick(), TickOutcome::Due);
    }

    #[tokio::test]
    async fn test_tick_refreshes_tracked_location_when_due() {
        let mut c = controller(&[Some(20.0), Some(21.0)], StaticGeolocator::unsupported());
        c.set_location(zurich()).await;

        for expected in [4, 3, 2, 1] {
            assert_eq!(c.tick().await, TickOutcome::Waiting(expected));
        }
        assert_eq!(c.tick().await, TickOutcome::Due);

        assert_eq!(c.source.requested().len(), 2);
        assert_eq!(c.current().unwrap().temperature(), 21.0);
        assert_eq!(c.seconds_until_next_refresh(), 5);
    }

    #[tokio::test]
    async fn test_failed_tick_refresh_still_resets_countdown() {
        let mut c = controller(&[None], StaticGeolocator::unsupported());
        for _ in 0..4 {
            c.tick().await;
        }
        assert_eq!(c.tick().await, TickOutcome::Due);
        assert!(c.error().is_some());
        assert_eq!(c.seconds_until_next_refresh(), 5);

        // No faster retry: the next tick just counts down
        assert_eq!(c.tick().await, TickOutcome::Waiting(4));
    }

    #[tokio::test]
    async fn test_toggle_off_then_on_resets_countdown() {
        let mut c = controller(&[], StaticGeolocator::unsupported());
        c.tick().await;
        c.tick().await;
        assert_eq!(c.seconds_until_next_refresh(), 3);

        c.toggle_auto_sync(false);
        assert!(!c.is_auto_sync_enabled());
        assert_eq!(c.tick().await, TickOutcome::Paused);

        c.toggle_auto_sync(true);
        assert_eq!(c.seconds_until_next_refresh(), 5);
    }

    #[tokio::test]
    async fn test_manual_refresh_restarts_countdown() {
        let mut c = controller(&[Some(20.0)], StaticGeolocator::unsupported());
        c.tick().await;
        c.tick().await;
        c.refresh(Some(zurich())).await;
        assert_eq!(c.seconds_until_next_refresh(), 5);
    }

    #[tokio::test]
    async fn test_dismiss_error() {
        let mut c = controller(&[], StaticGeolocator::unsupported());
        c.refresh(None).await;
        assert!(c.error().is_some());
        c.dismiss_error();
        assert!(c.error().is_none());
    }

    #[tokio::test]
    async fn test_borrowed_source() {
        let source = Scripted::new(&[Some(12.0)]);
        let mut c = RefreshController::new(
            &source,
            StaticGeolocator::unsupported(),
            ControllerSettings::default(),
        );
        c.refresh(Some(zurich())).await;
        drop(c);
        assert_eq!(source.requested().len(), 1);
    }
}
