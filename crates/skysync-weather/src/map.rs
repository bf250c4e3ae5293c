//! Location picker map as a scoped resource.
//!
//! A [`MapSession`] owns a [`MapWidget`]: the widget is mounted the first time the picker is
//! shown, its marker is moved in place afterwards, and it is unmounted exactly once when the
//! session is closed or dropped.

use crate::placeholder::{DEFAULT_LATITUDE, DEFAULT_LONGITUDE};
use crate::types::Coordinates;
use std::f64::consts::PI;

/// Zoom for the whole-world default view
pub const WORLD_ZOOM: u8 = 2;
/// Zoom for a known location
pub const LOCAL_ZOOM: u8 = 12;
/// Zoom after the user clicks a spot
pub const PICK_ZOOM: u8 = 14;

const TILE_URL: &str = "https://tile.openstreetmap.org";

/// A rendering surface for the picker
pub trait MapWidget {
    fn mount(&mut self, center: Coordinates, zoom: u8);

    fn move_marker(&mut self, position: Coordinates);

    /// Recenter the view. Widgets without animation can ignore this.
    fn fly_to(&mut self, _center: Coordinates, _zoom: u8) {}

    fn unmount(&mut self);
}

/// User interaction on a mounted map
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    /// Click on the map; the view follows the marker
    Click(Coordinates),
    /// Marker dropped after dragging; the view stays put
    DragEnd(Coordinates),
}

/// Initial zoom for a picker opened at `center`
pub fn initial_zoom(center: Coordinates) -> u8 {
    if center.latitude == DEFAULT_LATITUDE && center.longitude == DEFAULT_LONGITUDE {
        WORLD_ZOOM
    } else {
        LOCAL_ZOOM
    }
}

/// OSM slippy-map tile holding a point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl Tile {
    pub fn url(&self) -> String {
        format!("{}/{}/{}/{}.png", TILE_URL, self.zoom, self.x, self.y)
    }
}

/// Web Mercator tile indices for `coords` at `zoom`
pub fn tile_for(coords: Coordinates, zoom: u8) -> Tile {
    // Mercator is undefined at the poles
    let lat = coords.latitude.clamp(-85.051_128_78, 85.051_128_78).to_radians();
    let lon = coords.longitude.clamp(-180.0, 180.0);
    let n = 2f64.powi(i32::from(zoom));
    let max = (n as u32).saturating_sub(1);

    let x = ((lon + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - lat.tan().asinh() / PI) / 2.0 * n).floor();

    Tile {
        x: (x.max(0.0) as u32).min(max),
        y: (y.max(0.0) as u32).min(max),
        zoom,
    }
}

pub struct MapSession<W: MapWidget> {
    widget: W,
    mounted: bool,
    selected: Option<Coordinates>,
}

impl<W: MapWidget> MapSession<W> {
    pub fn new(widget: W) -> Self {
        Self {
            widget,
            mounted: false,
            selected: None,
        }
    }

    /// Show the picker at `position`: mounts on first use, otherwise just moves the marker.
    pub fn show(&mut self, position: Coordinates) {
        if self.mounted {
            self.widget.move_marker(position);
        } else {
            self.widget.mount(position, initial_zoom(position));
            self.mounted = true;
        }
        self.selected = Some(position);
    }

    /// Apply a user interaction and return the newly picked position.
    /// Events on an unmounted map are ignored.
    pub fn handle_event(&mut self, event: MapEvent) -> Option<Coordinates> {
        if !self.mounted {
            return None;
        }

        let position = match event {
            MapEvent::Click(position) => {
                self.widget.move_marker(position);
                self.widget.fly_to(position, PICK_ZOOM);
                position
            }
            MapEvent::DragEnd(position) => {
                self.widget.move_marker(position);
                position
            }
        };
        self.selected = Some(position);
        Some(position)
    }

    /// Last position shown or picked
    pub fn selected(&self) -> Option<Coordinates> {
        self.selected
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// Release the widget. Safe to call more than once.
    pub fn close(&mut self) {
        if self.mounted {
            self.widget.unmount();
            self.mounted = false;
        }
    }
}

impl<W: MapWidget> Drop for MapSession<W> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Headless widget that reports the tiles it would draw
#[derive(Debug, Default)]
pub struct TileLogger {
    zoom: u8,
}

impl TileLogger {
    /// Zoom of the current view
    pub fn zoom(&self) -> u8 {
        self.zoom
    }
}

impl MapWidget for TileLogger {
    fn mount(&mut self, center: Coordinates, zoom: u8) {
        self.zoom = zoom;
        tracing::info!("Map mounted at zoom {}: {}", zoom, tile_for(center, zoom).url());
    }

    fn move_marker(&mut self, position: Coordinates) {
        tracing::info!("Marker at {}", position.fallback_label());
    }

    fn fly_to(&mut self, center: Coordinates, zoom: u8) {
        self.zoom = zoom;
        tracing::info!("Map centered: {}", tile_for(center, zoom).url());
    }

    fn unmount(&mut self) {
        tracing::debug!("Map unmounted");
    }
}
