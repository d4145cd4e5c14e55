//! Interaction payloads reported by the map widget and the address searcher.

use crate::error::ControllerError;
use crate::types::GeoPoint;
use serde::Deserialize;

impl GeoPoint {
    /// Parses stringified coordinates, as delivered by address-search suggestions.
    /// Surrounding whitespace is ignored.
    pub fn parse(lng: &str, lat: &str) -> Result<Self, ControllerError> {
        Ok(Self::new(parse_axis("lng", lng)?, parse_axis("lat", lat)?))
    }
}

fn parse_axis(axis: &'static str, raw: &str) -> Result<f64, ControllerError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ControllerError::InvalidCoordinate {
            axis,
            value: raw.to_string(),
        })
}

/// `{ "lngLat": { "lng": .., "lat": .. } }`
#[derive(Debug, Clone, Deserialize)]
pub struct MapClick {
    #[serde(rename = "lngLat")]
    pub lng_lat: GeoPoint,
}

impl From<MapClick> for GeoPoint {
    fn from(click: MapClick) -> Self {
        click.lng_lat
    }
}

/// A selected address suggestion. Coordinates arrive as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct Suggestion {
    pub lat: String,
    pub lng: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl TryFrom<&Suggestion> for GeoPoint {
    type Error = ControllerError;

    fn try_from(suggestion: &Suggestion) -> Result<Self, Self::Error> {
        GeoPoint::parse(&suggestion.lng, &suggestion.lat)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CameraChange {
    pub lng: f64,
    pub lat: f64,
    pub zoom: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureClick {
    pub id: String,
}
