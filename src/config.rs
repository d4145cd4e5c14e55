use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub datasets: Vec<DatasetConfig>,
    pub electors: ElectorsConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    pub name: String,
    pub path: PathBuf, // GeoJSON FeatureCollection or Shapefile
}

#[derive(Debug, Deserialize, Clone)]
pub struct ElectorsConfig {
    pub csv: PathBuf,
}

/// Which feature properties carry the jurisdiction code and the feature id.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeatureConfig {
    pub code_property: String,
    pub id_property: Option<String>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            code_property: "CACODE".to_string(),
            id_property: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub center: [f64; 2], // [lng, lat]
    pub zoom: f64,
    pub min_zoom: f64,
    pub style: String,
    pub access_token: Option<String>,
    pub colors: Vec<String>,
    /// Datasets toggled on at startup, in order. The last one stays selected.
    pub initial_selection: Vec<String>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: [114.2029, 22.3844],
            zoom: 11.0,
            min_zoom: 10.0,
            style: "mapbox/streets-v9".to_string(),
            access_token: None,
            colors: ["#6e40e6", "#f49600", "#ff5d55", "#005ecd", "#ad0000"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            initial_selection: vec!["DCCA_2011".to_string(), "DCCA_2015".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            static_dir: None,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let mut config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        // Data paths are relative to the config file.
        if let Some(base) = path.parent() {
            for dataset in &mut config.datasets {
                dataset.path = base.join(&dataset.path);
            }
            config.electors.csv = base.join(&config.electors.csv);
            if let Some(dir) = &config.server.static_dir {
                config.server.static_dir = Some(base.join(dir));
            }
        }
        Ok(config)
    }
}
