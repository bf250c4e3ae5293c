//! Forward and reverse geocoding against Nominatim (OpenStreetMap).
//! Free, no API key required, but requests must carry an identifying user agent.

use crate::types::{Coordinates, GeocodeError, Location};
use reqwest::Client;
use serde::Deserialize;
use skysync_core::GeocodingConfig;
use std::time::Duration;
use tracing::instrument;

/// Best match for a free-text place search
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub coordinates: Coordinates,
    pub label: String,
}

impl GeocodeMatch {
    pub fn into_location(self) -> Location {
        Location {
            coordinates: self.coordinates,
            label: Some(self.label),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
    display_name: Option<String>,
}

/// Address breakdown returned by reverse geocoding
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NominatimAddress {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub suburb: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Client,
    search_url: String,
    reverse_url: String,
    language: String,
}

impl Geocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            search_url: config.search_url.clone(),
            reverse_url: config.reverse_url.clone(),
            language: config.language.clone(),
        })
    }

    /// Resolve a free-text query to its best match.
    /// Returns `Ok(None)` when nothing matches, which is a normal outcome.
    #[instrument(skip(self), level = "info")]
    pub async fn search(&self, query: &str) -> Result<Option<GeocodeMatch>, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let response = self
            .client
            .get(&self.search_url)
            .header("Accept-Language", &self.language)
            .query(&[("format", "json"), ("q", query), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let hits: Vec<SearchHit> = response.json().await?;
        let Some(hit) = hits.into_iter().next() else {
            tracing::debug!("No geocoding match for {:?}", query);
            return Ok(None);
        };

        let coordinates = parse_coordinates(&hit.lat, &hit.lon)?;
        let label = short_name(&hit.display_name).unwrap_or_else(|| coordinates.fallback_label());

        tracing::info!("Geocoded {:?} to {}", query, label);
        Ok(Some(GeocodeMatch { coordinates, label }))
    }

    /// Reverse geocode coordinates to a short place name (e.g. "Zurich, Switzerland").
    /// Never fails: any problem falls back to the formatted coordinates.
    #[instrument(skip(self), level = "debug")]
    pub async fn reverse(&self, coordinates: &Coordinates) -> String {
        match self.reverse_lookup(coordinates).await {
            Ok(body) => {
                let label = label_from_address(
                    body.address.as_ref(),
                    body.display_name.as_deref(),
                    coordinates,
                );
                tracing::info!("Reverse geocoded to: {}", label);
                label
            }
            Err(e) => {
                tracing::warn!("Reverse geocoding failed: {}", e);
                coordinates.fallback_label()
            }
        }
    }

    async fn reverse_lookup(
        &self,
        coordinates: &Coordinates,
    ) -> Result<NominatimResponse, GeocodeError> {
        let response = self
            .client
            .get(&self.reverse_url)
            .header("Accept-Language", &self.language)
            .query(&[
                ("format", "json".to_string()),
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("zoom", "10".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

fn parse_coordinates(lat: &str, lon: &str) -> Result<Coordinates, GeocodeError> {
    match (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
        (Ok(lat), Ok(lon)) => Ok(Coordinates::new(lat, lon)),
        _ => Err(GeocodeError::InvalidCoordinates(format!("{}, {}", lat, lon))),
    }
}

/// First two comma-separated parts of a Nominatim display name
fn short_name(display_name: &str) -> Option<String> {
    let parts: Vec<&str> = display_name
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .take(2)
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Trimmed field value, `None` when missing or blank
fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Pick a short place label from a reverse geocoding result.
///
/// Prefers city > town > village > suburb > county > state, adding the country when known.
/// Without any of those, uses the start of the display name, then the coordinates.
pub fn label_from_address(
    address: Option<&NominatimAddress>,
    display_name: Option<&str>,
    coordinates: &Coordinates,
) -> String {
    if let Some(addr) = address {
        let place = non_empty(&addr.city)
            .or_else(|| non_empty(&addr.town))
            .or_else(|| non_empty(&addr.village))
            .or_else(|| non_empty(&addr.suburb))
            .or_else(|| non_empty(&addr.county))
            .or_else(|| non_empty(&addr.state));

        match (place, non_empty(&addr.country)) {
            (Some(place), Some(country)) => return format!("{}, {}", place, country),
            (Some(place), None) => return place.to_string(),
            _ => {}
        }
    }

    display_name
        .and_then(short_name)
        .unwrap_or_else(|| coordinates.fallback_label())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> Coordinates {
        Coordinates::new(47.3769, 8.5417)
    }

    #[test]
    fn test_label_prefers_city_with_country() {
        let addr = NominatimAddress {
            city: Some("Zurich".into()),
            town: Some("Ignored".into()),
            country: Some("Switzerland".into()),
            ..Default::default()
        };
        assert_eq!(
            label_from_address(Some(&addr), None, &here()),
            "Zurich, Switzerland"
        );
    }

    #[test]
    fn test_label_falls_through_place_chain() {
        let addr = NominatimAddress {
            suburb: Some("Wiedikon".into()),
            county: Some("Bezirk Zürich".into()),
            ..Default::default()
        };
        assert_eq!(label_from_address(Some(&addr), None, &here()), "Wiedikon");
    }

    #[test]
    fn test_label_country_alone_uses_display_name() {
        let addr = NominatimAddress {
            country: Some("Switzerland".into()),
            ..Default::default()
        };
        assert_eq!(
            label_from_address(Some(&addr), Some("Lake Zurich, Zurich, Switzerland"), &here()),
            "Lake Zurich, Zurich"
        );
    }

    #[test]
    fn test_label_ignores_blank_fields() {
        let addr = NominatimAddress {
            city: Some("  ".into()),
            village: Some("Gornau".into()),
            country: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(label_from_address(Some(&addr), None, &here()), "Gornau");
    }

    #[test]
    fn test_label_falls_back_to_coordinates() {
        assert_eq!(label_from_address(None, None, &here()), "47.38°, 8.54°");
        assert_eq!(label_from_address(None, Some(" , "), &here()), "47.38°, 8.54°");
    }

    #[test]
    fn test_label_trims_address_fields() {
        let addr = NominatimAddress {
            town: Some("  Thun ".into()),
            country: Some(" Switzerland".into()),
            ..Default::default()
        };
        assert_eq!(label_from_address(Some(&addr), None, &here()), "Thun, Switzerland");
        assert_eq!(non_empty(&Some("   ".into())), None);
        assert_eq!(non_empty(&None), None);
    }

    #[test]
    fn test_short_name() {
        assert_eq!(
            short_name("Paris, Île-de-France, France métropolitaine, France").as_deref(),
            Some("Paris, Île-de-France")
        );
        assert_eq!(short_name("Atlantis").as_deref(), Some("Atlantis"));
        assert_eq!(short_name(""), None);
    }

    #[test]
    fn test_parse_coordinates() {
        assert_eq!(
            parse_coordinates("48.8566", "2.3522").unwrap(),
            Coordinates::new(48.8566, 2.3522)
        );
        assert!(matches!(
            parse_coordinates("north", "2.35"),
            Err(GeocodeError::InvalidCoordinates(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_query_is_no_match() {
        let geocoder = Geocoder::new(&GeocodingConfig::default()).unwrap();
        assert_eq!(geocoder.search("   ").await.unwrap(), None);
    }
}
