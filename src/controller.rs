//! Page state and the interaction handlers that mutate it.

use crate::config::MapConfig;
use crate::electors::{ElectorRow, ElectorsTable};
use crate::error::ControllerError;
use crate::events::Suggestion;
use crate::resolver;
use crate::types::{year_label, BoundaryDataset, GeoPoint, ResolvedMatch};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Colour of a year button that is not selected.
pub const UNSELECTED_COLOR: &str = "#e0e0e0";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapViewState {
    pub center: GeoPoint,
    pub zoom: f64,
    pub last_click: Option<GeoPoint>,
    pub selected_matches: Option<Vec<ResolvedMatch>>,
    /// Name of the dataset whose year button is highlighted.
    pub selected_dataset: Option<String>,
    pub clicked_feature_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearButton {
    pub name: String,
    pub label: String,
    pub highlighted: bool,
    pub color: String,
}

/// What the info panel renders: the selected year and the code of the
/// constituency resolved for that year, if any.
#[derive(Debug, Clone, Serialize)]
pub struct InfoPanel<'a> {
    pub year: Option<&'a str>,
    pub code: Option<&'a str>,
    pub electors: &'a [ElectorRow],
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    #[serde(flatten)]
    pub state: &'a MapViewState,
    pub current_year: Option<&'a str>,
    pub buttons: Vec<YearButton>,
    pub info: InfoPanel<'a>,
}

pub struct PageController {
    datasets: Arc<Vec<BoundaryDataset>>,
    electors: Arc<ElectorsTable>,
    palette: Vec<String>,
    state: MapViewState,
}

impl PageController {
    pub fn new(
        datasets: Arc<Vec<BoundaryDataset>>,
        electors: Arc<ElectorsTable>,
        map: &MapConfig,
    ) -> Self {
        Self {
            datasets,
            electors,
            palette: map.colors.clone(),
            state: MapViewState {
                center: GeoPoint::new(map.center[0], map.center[1]),
                zoom: map.zoom,
                last_click: None,
                selected_matches: None,
                selected_dataset: None,
                clicked_feature_id: None,
            },
        }
    }

    /// Builds a controller and applies the configured startup selection in
    /// order. With no configured selection the last dataset is selected.
    /// Dataset names must be unique.
    pub fn initialize(
        datasets: Arc<Vec<BoundaryDataset>>,
        electors: Arc<ElectorsTable>,
        map: &MapConfig,
    ) -> Result<Self, ControllerError> {
        {
            let mut seen = HashSet::new();
            if let Some(dup) = datasets.iter().find(|d| !seen.insert(d.name.as_str())) {
                return Err(ControllerError::DuplicateDataset(dup.name.clone()));
            }
        }

        let mut controller = Self::new(datasets, electors, map);
        for name in &map.initial_selection {
            controller.on_year_toggle(name)?;
        }
        if controller.state.selected_dataset.is_none() {
            if let Some(last) = controller.datasets.last() {
                controller.state.selected_dataset = Some(last.name.clone());
            }
        }
        Ok(controller)
    }

    pub fn state(&self) -> &MapViewState {
        &self.state
    }

    pub fn datasets(&self) -> &[BoundaryDataset] {
        &self.datasets
    }

    pub fn shared_datasets(&self) -> Arc<Vec<BoundaryDataset>> {
        Arc::clone(&self.datasets)
    }

    pub fn on_map_panned(&mut self, lng: f64, lat: f64, zoom: f64) {
        self.state.center = GeoPoint::new(lng, lat);
        self.state.zoom = zoom;
    }

    pub fn on_map_clicked(&mut self, point: GeoPoint) {
        self.select_point(point);
    }

    pub fn on_auto_suggest_clicked(&mut self, suggestion: &Suggestion) -> Result<(), ControllerError> {
        let point = GeoPoint::try_from(suggestion)?;
        self.select_point(point);
        Ok(())
    }

    pub fn on_map_feature_clicked(&mut self, feature_id: &str) {
        self.state.clicked_feature_id = Some(feature_id.to_string());
    }

    pub fn on_year_toggle(&mut self, name: &str) -> Result<(), ControllerError> {
        if !self.datasets.iter().any(|d| d.name == name) {
            return Err(ControllerError::UnknownDataset(name.to_string()));
        }
        info!(dataset = name, "year selected");
        self.state.selected_dataset = Some(name.to_string());
        Ok(())
    }

    fn select_point(&mut self, point: GeoPoint) {
        let matches = resolver::resolve(point, &self.datasets);
        debug!(lng = point.lng, lat = point.lat, matches = matches.len(), "resolved point");
        self.state.last_click = Some(point);
        self.state.selected_matches = Some(matches);
    }

    pub fn is_checked(&self, name: &str) -> bool {
        self.state.selected_dataset.as_deref() == Some(name)
    }

    pub fn current_year(&self) -> Option<&str> {
        self.state.selected_dataset.as_deref().map(year_label)
    }

    /// Code of the constituency matched in the selected dataset.
    pub fn current_code(&self) -> Option<&str> {
        let selected = self.state.selected_dataset.as_deref()?;
        self.state
            .selected_matches
            .as_ref()?
            .iter()
            .find(|m| m.dataset == selected)
            .map(|m| m.code.as_str())
    }

    pub fn info_panel(&self) -> InfoPanel<'_> {
        let year = self.current_year();
        let code = self.current_code();
        let electors: &[ElectorRow] = match (year, code) {
            (Some(year), Some(code)) => self.electors.lookup(year, code),
            _ => &[],
        };
        InfoPanel { year, code, electors }
    }

    pub fn year_buttons(&self) -> Vec<YearButton> {
        self.datasets
            .iter()
            .enumerate()
            .map(|(index, dataset)| {
                let highlighted = self.is_checked(&dataset.name);
                let color = match self.palette.get(index % self.palette.len().max(1)) {
                    Some(color) if highlighted => color.clone(),
                    _ => UNSELECTED_COLOR.to_string(),
                };
                YearButton {
                    name: dataset.name.clone(),
                    label: dataset.year().to_string(),
                    highlighted,
                    color,
                }
            })
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            state: &self.state,
            current_year: self.current_year(),
            buttons: self.year_buttons(),
            info: self.info_panel(),
        }
    }
}
