use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::geometry::GeometryModel;
use crate::hotspots::HotspotStore;
use crate::model::{CandidateRoute, Point};
use crate::pipeline::{self, SelectionError, SelectionResult};
use crate::render::{self, GeoJsonLayers};
use crate::routing::{RoutingClient, RoutingError};
use crate::time_mode::{self, TimeMode, TimeModeSetting};

// Shared, read-only after startup
pub struct AppState {
    pub hotspots: HotspotStore,
    pub routing: RoutingClient,
    pub geometry: GeometryModel,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error("invalid request: {0}")]
    InvalidInput(String),
}

// Body errors get the same JSON error shape as everything else
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Selection(SelectionError::EmptyCandidateSet) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_CANDIDATE_SET")
            }
            AppError::Routing(_) => (StatusCode::BAD_GATEWAY, "ROUTING_FAILED"),
            AppError::InvalidInput(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_INPUT"),
        };
        warn!(error = %self, "request failed");

        let body = json!({ "error": { "code": code, "message": self.to_string() } });
        (status, Json(body)).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    // Allows the browser frontend to talk to this API
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/route", post(route_between))
        .route("/select", post(select_given))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// --- API DTOs ---

#[derive(Deserialize)]
pub struct RouteRequest {
    pub origin: Point,
    pub destination: Point,
    #[serde(default)]
    pub mode: TimeModeSetting,
}

#[derive(Deserialize)]
pub struct SelectRequest {
    pub candidates: Vec<CandidateRoute>,
    #[serde(default)]
    pub mode: TimeModeSetting,
}

#[derive(Serialize)]
pub struct SelectionResponse {
    pub mode: TimeMode,
    pub selection: SelectionResult,
    /// Hotspot and route layers ready for a web map.
    pub layers: FeatureCollection,
}

// --- Handlers ---

async fn route_between(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> Result<Json<SelectionResponse>, AppError> {
    let Json(payload) = payload?;
    for (name, p) in [("origin", payload.origin), ("destination", payload.destination)] {
        if !p.is_valid() {
            return Err(AppError::InvalidInput(format!("{name} is out of range")));
        }
    }

    let candidates = state
        .routing
        .alternatives(payload.origin, payload.destination)
        .await?;

    respond(&state, &candidates, payload.mode).map(Json)
}

async fn select_given(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SelectRequest>, JsonRejection>,
) -> Result<Json<SelectionResponse>, AppError> {
    let Json(payload) = payload?;
    respond(&state, &payload.candidates, payload.mode).map(Json)
}

fn respond(
    state: &AppState,
    candidates: &[CandidateRoute],
    setting: TimeModeSetting,
) -> Result<SelectionResponse, AppError> {
    let mode = time_mode::resolve_now(setting);
    let hotspots = state.hotspots.collection(mode);

    let selection = pipeline::select(candidates, hotspots, state.geometry)?;
    info!(
        ?mode,
        candidates = candidates.len(),
        winner_risk = selection.winner.risk,
        max_risk = selection.max_risk_observed,
        "route selected"
    );

    let mut layers = GeoJsonLayers::new();
    render::render(&selection, hotspots, &mut layers);

    Ok(SelectionResponse {
        mode,
        selection,
        layers: layers.into_feature_collection(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;
    use crate::model::{HotspotCollection, HotspotPolygon};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let night = HotspotCollection::new(vec![HotspotPolygon::square(
            Point::new(34.05, -118.25),
            200.0,
        )]);
        let state = AppState {
            hotspots: HotspotStore::new(Some(HotspotCollection::default()), Some(night)),
            // nothing listens on the discard port
            routing: RoutingClient::new(&RoutingConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                profile: "driving".to_string(),
                timeout_secs: 2,
            })
            .unwrap(),
            geometry: GeometryModel::Planar,
        };
        router(Arc::new(state))
    }

    async fn post_raw(app: Router, uri: &str, body: String) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        post_raw(app, uri, body.to_string()).await
    }

    fn candidate(lat: f64, distance: f64) -> Value {
        json!({
            "line": [{ "lat": lat, "lng": -118.30 }, { "lat": lat, "lng": -118.20 }],
            "distance_meters": distance,
            "duration_seconds": 900.0
        })
    }

    fn two_lanes(mode: Option<&str>) -> Value {
        let mut body = json!({
            "candidates": [candidate(34.05, 8000.0), candidate(34.10, 7000.0)]
        });
        if let Some(mode) = mode {
            body["mode"] = json!(mode);
        }
        body
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn night_selection_avoids_hotspot() {
        let (status, body) = post(app(), "/select", two_lanes(Some("night"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "night");
        assert_eq!(body["selection"]["winner"]["risk"], 0);
        assert_eq!(body["selection"]["winner"]["route"]["distance_meters"], 7000.0);
        assert_eq!(body["selection"]["max_risk_observed"], 1);
        assert_eq!(body["selection"]["all_scored"].as_array().unwrap().len(), 2);
        // one hotspot and two routes
        assert_eq!(body["layers"]["features"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn day_selection_prefers_longer() {
        let (status, body) = post(app(), "/select", two_lanes(Some("day"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selection"]["winner"]["route"]["distance_meters"], 8000.0);
        assert_eq!(body["selection"]["max_risk_observed"], 0);
    }

    #[tokio::test]
    async fn omitted_mode_follows_clock() {
        let (status, body) = post(app(), "/select", two_lanes(None)).await;

        assert_eq!(status, StatusCode::OK);
        let mode = body["mode"].as_str().unwrap();
        assert!(mode == "day" || mode == "night", "unexpected mode {mode}");
        // whichever dataset applied, the result must be consistent with it
        let expected_winner = if mode == "night" { 7000.0 } else { 8000.0 };
        assert_eq!(body["selection"]["winner"]["route"]["distance_meters"], expected_winner);
    }

    #[tokio::test]
    async fn empty_candidates_are_rejected() {
        let (status, body) =
            post(app(), "/select", json!({ "mode": "day", "candidates": [] })).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "EMPTY_CANDIDATE_SET");
    }

    #[tokio::test]
    async fn single_point_line_is_invalid_input() {
        let body = json!({
            "mode": "day",
            "candidates": [{
                "line": [{ "lat": 34.0, "lng": -118.0 }],
                "distance_meters": 100.0,
                "duration_seconds": 10.0
            }]
        });
        let (status, body) = post(app(), "/select", body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert!(body["error"]["message"].as_str().unwrap().contains("at least 2 points"));
    }

    #[tokio::test]
    async fn out_of_range_line_point_is_invalid_input() {
        let body = json!({
            "candidates": [{
                "line": [{ "lat": 34.0, "lng": -118.0 }, { "lat": 34.0, "lng": -218.0 }],
                "distance_meters": 100.0,
                "duration_seconds": 10.0
            }]
        });
        let (status, body) = post(app(), "/select", body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn unknown_mode_is_invalid_input() {
        let (status, body) = post(app(), "/select", two_lanes(Some("dusk"))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_input() {
        let (status, body) = post_raw(app(), "/select", "{\"candidates\": [".to_string()).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn out_of_range_origin_is_rejected() {
        let body = json!({
            "origin": { "lat": 134.0, "lng": 0.0 },
            "destination": { "lat": 34.0, "lng": -118.0 }
        });
        let (status, body) = post(app(), "/route", body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn unreachable_router_is_bad_gateway() {
        let body = json!({
            "origin": { "lat": 34.05, "lng": -118.30 },
            "destination": { "lat": 34.05, "lng": -118.20 }
        });
        let (status, body) = post(app(), "/route", body).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "ROUTING_FAILED");
    }
}
