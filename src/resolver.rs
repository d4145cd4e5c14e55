//! Point-in-polygon resolution across boundary datasets.
//!
//! Every dataset is scanned linearly; the first feature containing the point
//! wins. Points exactly on an edge resolve by the half-open rule of the ray
//! cast below (an edge owns its lower endpoint, not its upper one), so the
//! outcome is deterministic but not meaningful.

use crate::types::{BoundaryDataset, Feature, GeoPoint, ResolvedMatch};
use geo::{Coord, LineString, Polygon};
use serde_json::Value;

/// Finds, for each dataset in order, the first feature containing `point`.
/// Datasets without a containing feature contribute nothing.
pub fn resolve(point: GeoPoint, datasets: &[BoundaryDataset]) -> Vec<ResolvedMatch> {
    datasets
        .iter()
        .filter_map(|dataset| resolve_in(point, dataset))
        .collect()
}

/// Resolves `point` against a single dataset.
pub fn resolve_in(point: GeoPoint, dataset: &BoundaryDataset) -> Option<ResolvedMatch> {
    let feature = dataset
        .features
        .iter()
        .find(|feature| feature_contains(feature, point))?;

    let year = dataset.year().to_string();
    let mut properties = feature.properties.clone();
    properties.insert("year".to_string(), Value::String(year.clone()));

    Some(ResolvedMatch {
        year,
        code: feature.code.clone(),
        dataset: dataset.name.clone(),
        id: feature.id.clone(),
        label: feature.label().map(str::to_string),
        properties,
    })
}

pub fn feature_contains(feature: &Feature, point: GeoPoint) -> bool {
    let Some(bbox) = feature.bbox() else {
        return false;
    };
    let (min, max) = (bbox.min(), bbox.max());
    if point.lng < min.x || point.lng > max.x || point.lat < min.y || point.lat > max.y {
        return false;
    }

    feature
        .geometry()
        .iter()
        .any(|polygon| polygon_contains(polygon, point))
}

/// Inside the exterior ring and outside every hole. A degenerate exterior
/// contains nothing; a degenerate hole excludes nothing.
pub fn polygon_contains(polygon: &Polygon<f64>, point: GeoPoint) -> bool {
    ring_contains(polygon.exterior(), point)
        && !polygon
            .interiors()
            .iter()
            .any(|hole| ring_contains(hole, point))
}

/// Even-odd ray cast. The ring is treated as closed whether or not its last
/// vertex repeats the first.
pub fn ring_contains(ring: &LineString<f64>, point: GeoPoint) -> bool {
    let mut vertices: &[Coord<f64>] = &ring.0;
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices = &vertices[..vertices.len() - 1];
    }
    if vertices.len() < 3 {
        return false;
    }

    let (x, y) = (point.lng, point.lat);
    let mut inside = false;
    let mut prev = vertices[vertices.len() - 1];
    for &curr in vertices {
        if (curr.y > y) != (prev.y > y) {
            let cross_x = (prev.x - curr.x) * (y - curr.y) / (prev.y - curr.y) + curr.x;
            if x < cross_x {
                inside = !inside;
            }
        }
        prev = curr;
    }
    inside
}
