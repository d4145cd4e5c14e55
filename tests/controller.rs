use dcca_map::config::AppConfig;
use dcca_map::controller::PageController;
use dcca_map::data;
use dcca_map::electors::ElectorsTable;
use dcca_map::events::Suggestion;
use dcca_map::types::GeoPoint;
use std::path::Path;
use std::sync::Arc;

fn bundled_controller() -> PageController {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml");
    let config = AppConfig::load_from_file(&path).unwrap();
    let datasets = data::load_datasets(&config).unwrap();
    let electors =
        ElectorsTable::load(&config.electors.csv, &config.features.code_property).unwrap();
    PageController::initialize(Arc::new(datasets), Arc::new(electors), &config.map).unwrap()
}

#[test]
fn bundled_datasets_load() {
    let controller = bundled_controller();
    let names: Vec<&str> = controller.datasets().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["DCCA_2011", "DCCA_2015", "DCCA_2019"]);
    assert_eq!(controller.datasets()[0].features.len(), 2);
}

#[test]
fn year_toggle_is_exclusive() {
    let mut controller = bundled_controller();
    controller.on_year_toggle("DCCA_2011").unwrap();
    controller.on_year_toggle("DCCA_2015").unwrap();

    let checked: Vec<&str> = controller
        .datasets()
        .iter()
        .filter(|d| controller.is_checked(&d.name))
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(checked, vec!["DCCA_2015"]);
}

#[test]
fn click_and_suggestion_resolve_identically() {
    let mut clicked = bundled_controller();
    clicked.on_map_clicked(GeoPoint::new(114.21, 22.285));

    let mut suggested = bundled_controller();
    suggested
        .on_auto_suggest_clicked(&Suggestion {
            lat: "22.285".into(),
            lng: "114.21".into(),
            label: Some("1 Queen's Road Central".into()),
        })
        .unwrap();

    assert_eq!(clicked.state().selected_matches, suggested.state().selected_matches);
    assert_eq!(clicked.state().last_click, suggested.state().last_click);

    let codes: Vec<(&str, &str)> = clicked
        .state()
        .selected_matches
        .as_ref()
        .unwrap()
        .iter()
        .map(|m| (m.year.as_str(), m.code.as_str()))
        .collect();
    assert_eq!(codes, vec![("2011", "A02"), ("2015", "A01")]);
}

#[test]
fn info_panel_uses_electors_for_selected_year() {
    let mut controller = bundled_controller();
    controller.on_map_clicked(GeoPoint::new(114.16, 22.275));

    let info = controller.info_panel();
    assert_eq!(info.year, Some("2015"));
    assert_eq!(info.code, Some("A01"));
    assert_eq!(info.electors[0]["candidate"], "Ho Wing Sze");

    controller.on_year_toggle("DCCA_2011").unwrap();
    assert_eq!(controller.info_panel().electors.len(), 2);

    controller.on_year_toggle("DCCA_2019").unwrap();
    let info = controller.info_panel();
    assert_eq!(info.code, None);
    assert!(info.electors.is_empty());
}

#[test]
fn hole_in_bundled_boundary() {
    let mut controller = bundled_controller();
    controller.on_map_clicked(GeoPoint::new(114.175, 22.285));

    let matches = controller.state().selected_matches.as_ref().unwrap();
    // 2011's A01 has a hole here; 2015's A01 does not
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].year, "2015");
}
