use crate::config::{AppConfig, DatasetConfig, FeatureConfig};
use crate::types::{BoundaryDataset, Feature};
use anyhow::{anyhow, Context, Result};
use geo::MultiPolygon;
use geojson::GeoJson;
use serde_json::{Map, Value};
use shapefile::dbase::FieldValue;
use shapefile::Reader;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use tracing::{info, warn};

pub fn load_datasets(config: &AppConfig) -> Result<Vec<BoundaryDataset>> {
    info!("Loading {} boundary datasets...", config.datasets.len());

    let mut names = HashSet::new();
    for dataset in &config.datasets {
        if !names.insert(dataset.name.as_str()) {
            return Err(anyhow!("Dataset '{}' is configured more than once", dataset.name));
        }
    }

    let datasets = config
        .datasets
        .iter()
        .map(|dataset| load_dataset(dataset, &config.features))
        .collect::<Result<Vec<_>>>()?;

    for dataset in &datasets {
        info!(
            dataset = %dataset.name,
            features = dataset.features.len(),
            "loaded boundary dataset"
        );
    }
    Ok(datasets)
}

pub fn load_dataset(dataset: &DatasetConfig, features: &FeatureConfig) -> Result<BoundaryDataset> {
    let extension = dataset
        .path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Dataset file has no extension: {:?}", dataset.path))?;

    match extension.as_str() {
        "shp" => load_shapefile(dataset, features),
        "json" | "geojson" => {
            let file = File::open(&dataset.path)
                .with_context(|| format!("Failed to open GeoJSON file: {:?}", dataset.path))?;
            read_geojson(&dataset.name, BufReader::new(file), features)
                .with_context(|| format!("Failed to load dataset {}", dataset.name))
        }
        _ => Err(anyhow!("Unsupported geometry format: {}", extension)),
    }
}

/// Reads a GeoJSON FeatureCollection into a dataset named `name`.
pub fn read_geojson<R: Read>(
    name: &str,
    reader: R,
    config: &FeatureConfig,
) -> Result<BoundaryDataset> {
    let geojson = GeoJson::from_reader(reader).context("Failed to parse GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let mut features = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let properties = feature.properties.unwrap_or_default();

        let Some(code) = property_string(&properties, &config.code_property) else {
            warn!(dataset = name, index, "feature has no '{}', skipping", config.code_property);
            continue;
        };

        let id = match &feature.id {
            Some(geojson::feature::Id::String(s)) => s.clone(),
            Some(geojson::feature::Id::Number(n)) => n.to_string(),
            None => config
                .id_property
                .as_deref()
                .and_then(|key| property_string(&properties, key))
                .unwrap_or_else(|| index.to_string()),
        };

        let geometry = match feature.geometry {
            Some(geom) => {
                let geo_geom: geo::Geometry<f64> = match geom.value.try_into() {
                    Ok(g) => g,
                    Err(e) => {
                        warn!(dataset = name, %id, "unreadable geometry ({}), skipping", e);
                        continue;
                    }
                };
                match geo_geom {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => {
                        warn!(dataset = name, %id, "non-polygonal geometry, skipping");
                        continue;
                    }
                }
            }
            None => {
                warn!(dataset = name, %id, "feature has no geometry, skipping");
                continue;
            }
        };

        features.push(Feature::new(id, code, geometry, properties));
    }

    Ok(BoundaryDataset::new(name, features))
}

fn load_shapefile(dataset: &DatasetConfig, config: &FeatureConfig) -> Result<BoundaryDataset> {
    let mut reader = Reader::from_path(&dataset.path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", dataset.path))?;

    let mut features = Vec::new();

    for (index, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result?;

        let properties: Map<String, Value> = record
            .into_iter()
            .map(|(field, value)| (field, field_to_json(value)))
            .collect();

        let Some(code) = property_string(&properties, &config.code_property) else {
            warn!(dataset = %dataset.name, index, "record has no '{}', skipping", config.code_property);
            continue;
        };
        let id = config
            .id_property
            .as_deref()
            .and_then(|key| property_string(&properties, key))
            .unwrap_or_else(|| index.to_string());

        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?,
            shapefile::Shape::PolygonM(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygonM: {:?}", e))?,
            shapefile::Shape::PolygonZ(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygonZ: {:?}", e))?,
            _ => {
                warn!(dataset = %dataset.name, %id, "non-polygonal shape, skipping");
                continue;
            }
        };

        features.push(Feature::new(id, code, geometry, properties));
    }

    Ok(BoundaryDataset::new(dataset.name.clone(), features))
}

fn property_string(properties: &Map<String, Value>, key: &str) -> Option<String> {
    match properties.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field_to_json(value: FieldValue) -> Value {
    match value {
        FieldValue::Character(Some(s)) => Value::String(s.trim().to_string()),
        FieldValue::Numeric(Some(n)) => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        FieldValue::Integer(n) => Value::from(n),
        FieldValue::Float(Some(n)) => serde_json::Number::from_f64(n as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        FieldValue::Double(n) => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        FieldValue::Logical(Some(b)) => Value::Bool(b),
        FieldValue::Memo(s) => Value::String(s),
        _ => Value::Null,
    }
}
