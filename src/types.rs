use geo::bounding_rect::BoundingRect;
use geo::{MultiPolygon, Rect};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A longitude/latitude pair in degrees. No normalization or range checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// A single boundary polygon (or multi-part polygon) with its metadata.
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: String,
    geometry: MultiPolygon<f64>,
    /// Jurisdiction code, e.g. the CACODE of a constituency area.
    pub code: String,
    pub properties: Map<String, Value>,
    bbox: Option<Rect<f64>>,
}

impl Feature {
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        geometry: MultiPolygon<f64>,
        properties: Map<String, Value>,
    ) -> Self {
        let bbox = geometry.bounding_rect();
        Self {
            id: id.into(),
            geometry,
            code: code.into(),
            properties,
            bbox,
        }
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// Bounding box of the geometry, `None` when the geometry has no coordinates.
    pub fn bbox(&self) -> Option<Rect<f64>> {
        self.bbox
    }

    /// Human label of the feature, if the metadata carries one.
    pub fn label(&self) -> Option<&str> {
        ["ENAME", "NAME", "name"]
            .iter()
            .find_map(|key| self.properties.get(*key).and_then(Value::as_str))
    }
}

/// One electoral cycle's boundary set, e.g. `DCCA_2015`.
#[derive(Debug, Clone)]
pub struct BoundaryDataset {
    pub name: String,
    pub features: Vec<Feature>,
}

impl BoundaryDataset {
    pub fn new(name: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            name: name.into(),
            features,
        }
    }

    /// The year encoded after the first `_` of the name. Names without a
    /// suffix are their own year label.
    pub fn year(&self) -> &str {
        year_label(&self.name)
    }
}

pub fn year_label(name: &str) -> &str {
    match name.split('_').nth(1) {
        Some(year) if !year.is_empty() => year,
        _ => name,
    }
}

/// A feature that contains a queried point, tagged with its dataset's year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMatch {
    pub year: String,
    #[serde(rename = "CACODE")]
    pub code: String,
    pub dataset: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub properties: Map<String, Value>,
}
