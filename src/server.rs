use crate::config::AppConfig;
use crate::controller::PageController;
use crate::error::ControllerError;
use crate::events::{CameraChange, FeatureClick, MapClick, Suggestion};
use crate::resolver;
use crate::types::{BoundaryDataset, GeoPoint, ResolvedMatch};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

pub struct AppState {
    pub datasets: Arc<Vec<BoundaryDataset>>,
    pub controller: Mutex<PageController>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, controller: PageController) -> Self {
        Self {
            datasets: controller.shared_datasets(),
            controller: Mutex::new(controller),
            config,
        }
    }
}

#[derive(Deserialize)]
pub struct ResolveParams {
    lng: f64,
    lat: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapWidgetConfig {
    center_point: [f64; 2],
    zoom: f64,
    style_reference: String,
    min_zoom: f64,
    layer_list: Vec<LayerInfo>,
    color_palette: Vec<String>,
    access_token: Option<String>,
}

#[derive(Serialize)]
pub struct LayerInfo {
    name: String,
    year: String,
    url: String,
}

impl IntoResponse for ControllerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ControllerError::UnknownDataset(_) => StatusCode::NOT_FOUND,
            ControllerError::DuplicateDataset(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ControllerError::InvalidCoordinate { .. } => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub async fn start_server(config: AppConfig, controller: PageController) -> Result<()> {
    let port = config.server.port;
    let state = Arc::new(AppState::new(config, controller));
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/api/state", get(state_handler))
        .route("/api/map", get(map_handler))
        .route("/api/resolve", get(resolve_handler))
        .route("/api/pan", post(pan_handler))
        .route("/api/click", post(click_handler))
        .route("/api/suggestion", post(suggestion_handler))
        .route("/api/feature", post(feature_handler))
        .route("/api/year/:name", post(year_handler));

    // Raw boundary files for the map widget's layers
    for dataset in &state.config.datasets {
        app = app.route_service(
            &format!("/layers/{}", dataset.name),
            ServeFile::new(&dataset.path),
        );
    }

    if let Some(dir) = &state.config.server.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive()).with_state(state)
}

fn snapshot_json(controller: &PageController) -> Json<Value> {
    Json(serde_json::to_value(controller.snapshot()).unwrap_or(Value::Null))
}

async fn state_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let controller = state.controller.lock().await;
    snapshot_json(&controller)
}

async fn map_handler(State(state): State<Arc<AppState>>) -> Json<MapWidgetConfig> {
    let map = &state.config.map;
    let layer_list = state
        .datasets
        .iter()
        .map(|dataset| LayerInfo {
            name: dataset.name.clone(),
            year: dataset.year().to_string(),
            url: format!("/layers/{}", dataset.name),
        })
        .collect();

    Json(MapWidgetConfig {
        center_point: map.center,
        zoom: map.zoom,
        style_reference: map.style.clone(),
        min_zoom: map.min_zoom,
        layer_list,
        color_palette: map.colors.clone(),
        access_token: map.access_token.clone(),
    })
}

async fn resolve_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveParams>,
) -> Json<Vec<ResolvedMatch>> {
    let point = GeoPoint::new(params.lng, params.lat);
    Json(resolver::resolve(point, &state.datasets))
}

async fn pan_handler(
    State(state): State<Arc<AppState>>,
    Json(camera): Json<CameraChange>,
) -> Json<Value> {
    let mut controller = state.controller.lock().await;
    controller.on_map_panned(camera.lng, camera.lat, camera.zoom);
    snapshot_json(&controller)
}

async fn click_handler(
    State(state): State<Arc<AppState>>,
    Json(click): Json<MapClick>,
) -> Json<Value> {
    let mut controller = state.controller.lock().await;
    controller.on_map_clicked(click.into());
    snapshot_json(&controller)
}

async fn suggestion_handler(
    State(state): State<Arc<AppState>>,
    Json(suggestion): Json<Suggestion>,
) -> Result<Json<Value>, ControllerError> {
    let mut controller = state.controller.lock().await;
    controller.on_auto_suggest_clicked(&suggestion)?;
    if let Some(label) = &suggestion.label {
        info!(address = %label, "address suggestion selected");
    }
    Ok(snapshot_json(&controller))
}

async fn feature_handler(
    State(state): State<Arc<AppState>>,
    Json(click): Json<FeatureClick>,
) -> Json<Value> {
    let mut controller = state.controller.lock().await;
    controller.on_map_feature_clicked(&click.id);
    snapshot_json(&controller)
}

async fn year_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ControllerError> {
    let mut controller = state.controller.lock().await;
    controller.on_year_toggle(&name)?;
    Ok(snapshot_json(&controller))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::electors::ElectorsTable;
    use crate::types::Feature;
    use axum::body::Body;
    use axum::http::{header, Request};
    use geo::{polygon, MultiPolygon};
    use http_body_util::BodyExt;
    use serde_json::Map;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let config: AppConfig = toml::from_str(
            r#"
            [[datasets]]
            name = "DCCA_2011"
            path = "missing/DCCA_2011.geojson"

            [[datasets]]
            name = "DCCA_2015"
            path = "missing/DCCA_2015.geojson"

            [electors]
            csv = "missing/electors.csv"
            "#,
        )
        .unwrap();

        let square = polygon![
            (x: 114.0, y: 22.0),
            (x: 114.5, y: 22.0),
            (x: 114.5, y: 22.5),
            (x: 114.0, y: 22.5),
        ];
        let datasets = vec![
            BoundaryDataset::new(
                "DCCA_2011",
                vec![Feature::new("A1", "A1", MultiPolygon::new(vec![square]), Map::new())],
            ),
            BoundaryDataset::new("DCCA_2015", vec![]),
        ];
        let controller = PageController::initialize(
            Arc::new(datasets),
            Arc::new(ElectorsTable::default()),
            &config.map,
        )
        .unwrap();
        Arc::new(AppState::new(config, controller))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn resolve_endpoint_is_stateless() {
        let state = test_state();
        let app = build_router(state.clone());
        let (status, body) = send(
            app,
            Request::get("/api/resolve?lng=114.2&lat=22.2").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{
            "year": "2011",
            "CACODE": "A1",
            "dataset": "DCCA_2011",
            "id": "A1",
            "properties": { "year": "2011" }
        }]));
        assert!(state.controller.lock().await.state().last_click.is_none());
    }

    #[tokio::test]
    async fn click_and_suggestion_agree() {
        let state = test_state();
        let (_, clicked) = send(
            build_router(state.clone()),
            post_json("/api/click", json!({ "lngLat": { "lng": 114.2, "lat": 22.2 } })),
        )
        .await;
        let (status, suggested) = send(
            build_router(state),
            post_json("/api/suggestion", json!({ "lng": "114.2", "lat": "22.2" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(clicked["selected_matches"], suggested["selected_matches"]);
        assert_eq!(suggested["last_click"], json!({ "lng": 114.2, "lat": 22.2 }));
    }

    #[tokio::test]
    async fn year_toggle_errors_map_to_status_codes() {
        let state = test_state();
        let (status, body) = send(
            build_router(state.clone()),
            post_json("/api/year/DCCA_1999", Value::Null),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("DCCA_1999"));

        let (status, body) = send(
            build_router(state.clone()),
            post_json("/api/year/DCCA_2011", Value::Null),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_year"], "2011");

        let (status, _) = send(
            build_router(state),
            post_json("/api/suggestion", json!({ "lng": "east", "lat": "22.2" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn layer_files_are_served_by_name() {
        let state = test_state();
        let mut config = state.config.clone();
        config.datasets[0].path =
            std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/DCCA_2011.geojson");
        let controller = PageController::initialize(
            state.datasets.clone(),
            Arc::new(ElectorsTable::default()),
            &config.map,
        )
        .unwrap();
        let app = build_router(Arc::new(AppState::new(config, controller)));

        let (status, body) = send(
            app.clone(),
            Request::get("/layers/DCCA_2011").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(body["features"][0]["properties"]["CACODE"], "A01");

        let (status, _) = send(
            app,
            Request::get("/layers/DCCA_2015").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn map_config_lists_layers() {
        let (status, body) = send(
            build_router(test_state()),
            Request::get("/api/map").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["centerPoint"], json!([114.2029, 22.3844]));
        assert_eq!(body["minZoom"], 10.0);
        assert_eq!(body["styleReference"], "mapbox/streets-v9");
        assert_eq!(body["layerList"][1]["url"], "/layers/DCCA_2015");
        assert_eq!(body["colorPalette"].as_array().unwrap().len(), 5);
    }
}
