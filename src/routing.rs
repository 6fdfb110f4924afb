//! Client for an OSRM-compatible routing service.
//!
//! Only fetches alternatives; every ranking decision is made by
//! [`crate::pipeline::select`].

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::RoutingConfig;
use crate::model::{CandidateRoute, ModelError, Point, RouteLine};

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("routing service returned {code}: {message}")]
    Service { code: String, message: String },
    #[error("routing service returned no routes")]
    NoRoutes,
    #[error("route {index} has unusable geometry: {source}")]
    Geometry { index: usize, source: ModelError },
}

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    distance: f64,
    duration: f64,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>, // [lon, lat]
}

pub struct RoutingClient {
    http: reqwest::Client,
    base_url: String,
    profile: String,
}

impl RoutingClient {
    pub fn new(config: &RoutingConfig) -> Result<Self, RoutingError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile.clone(),
        })
    }

    pub fn route_url(&self, origin: Point, destination: Point) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?alternatives=true&overview=full&geometries=geojson",
            self.base_url, self.profile, origin.lng, origin.lat, destination.lng, destination.lat
        )
    }

    /// Fetch alternative routes between two points. Never returns an empty list.
    pub async fn alternatives(
        &self,
        origin: Point,
        destination: Point,
    ) -> Result<Vec<CandidateRoute>, RoutingError> {
        let url = self.route_url(origin, destination);
        debug!(%url, "requesting alternatives");

        // OSRM reports "NoRoute" etc. with a 4xx status and a JSON body
        let response = self.http.get(&url).send().await?;
        let body: OsrmResponse = response.json().await?;
        parse_response(body)
    }
}

fn parse_response(body: OsrmResponse) -> Result<Vec<CandidateRoute>, RoutingError> {
    if body.code != "Ok" {
        return Err(RoutingError::Service {
            message: body.message.unwrap_or_default(),
            code: body.code,
        });
    }
    if body.routes.is_empty() {
        return Err(RoutingError::NoRoutes);
    }

    body.routes
        .into_iter()
        .enumerate()
        .map(|(index, route)| {
            let points = route
                .geometry
                .coordinates
                .iter()
                .map(|&[lng, lat]| Point::new(lat, lng))
                .collect();
            let line = RouteLine::new(points)
                .map_err(|source| RoutingError::Geometry { index, source })?;
            Ok(CandidateRoute {
                line,
                distance_meters: route.distance,
                duration_seconds: route.duration,
            })
        })
        .collect()
}
