//! Line/polygon intersection between route paths and hotspot zones.
//!
//! The default [`GeometryModel::Planar`] treats lat/lng as Cartesian x/y.
//! At city scale this is indistinguishable from the true answer. For long
//! route segments, [`GeometryModel::Geodesic`] first densifies the route
//! along great circles so the tested path follows the earth's surface.

use geo::prelude::*;
use geo::{LineString, Polygon};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{HotspotPolygon, RouteLine};

#[derive(Error, Debug, PartialEq)]
pub enum GeometryError {
    #[error("hotspot ring needs at least 4 points, got {0}")]
    TooFewPoints(usize),
    #[error("hotspot ring is not closed")]
    NotClosed,
    #[error("hotspot ring point {0} is out of range")]
    InvalidCoordinate(usize),
    #[error("hotspot ring has zero area")]
    Degenerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum GeometryModel {
    #[default]
    Planar,
    Geodesic {
        /// Longest great-circle step between densified points, in metres.
        max_segment_m: f64,
    },
}

/// Axis-aligned bounding box in (lng, lat).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Envelope {
    fn of(line: &LineString<f64>) -> Self {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for c in line.coords() {
            min[0] = min[0].min(c.x);
            min[1] = min[1].min(c.y);
            max[0] = max[0].max(c.x);
            max[1] = max[1].max(c.y);
        }
        Self { min, max }
    }

    pub fn overlaps(&self, other: &Envelope) -> bool {
        self.min[0] <= other.max[0]
            && other.min[0] <= self.max[0]
            && self.min[1] <= other.max[1]
            && other.min[1] <= self.max[1]
    }
}

/// A route path prepared for repeated intersection tests.
#[derive(Debug, Clone)]
pub struct ScoreableLine {
    line: LineString<f64>,
    envelope: Envelope,
}

impl ScoreableLine {
    pub fn new(route: &RouteLine, model: GeometryModel) -> Self {
        let line = match model {
            GeometryModel::Planar => route.to_line_string(),
            GeometryModel::Geodesic { max_segment_m } => densify(route, max_segment_m),
        };
        let envelope = Envelope::of(&line);
        Self { line, envelope }
    }

    pub fn envelope(&self) -> Envelope {
        self.envelope
    }
}

/// A hotspot ring that passed validation.
#[derive(Debug, Clone)]
pub struct Zone {
    polygon: Polygon<f64>,
    envelope: Envelope,
}

impl Zone {
    pub fn envelope(&self) -> Envelope {
        self.envelope
    }
}

impl TryFrom<&HotspotPolygon> for Zone {
    type Error = GeometryError;

    fn try_from(hotspot: &HotspotPolygon) -> Result<Self, Self::Error> {
        let ring = &hotspot.ring;
        if ring.len() < 4 {
            return Err(GeometryError::TooFewPoints(ring.len()));
        }
        if let Some(index) = ring.iter().position(|p| !p.is_valid()) {
            return Err(GeometryError::InvalidCoordinate(index));
        }
        if ring.first() != ring.last() {
            return Err(GeometryError::NotClosed);
        }

        let exterior: LineString<f64> = ring.iter().map(|p| p.to_coord()).collect();
        let polygon = Polygon::new(exterior, vec![]);
        if polygon.unsigned_area() == 0.0 {
            return Err(GeometryError::Degenerate);
        }

        let envelope = Envelope::of(polygon.exterior());
        Ok(Self { polygon, envelope })
    }
}

/// Does the route touch the zone's boundary or interior?
pub fn line_intersects_zone(line: &ScoreableLine, zone: &Zone) -> bool {
    line.envelope.overlaps(&zone.envelope) && line.line.intersects(&zone.polygon)
}

/// Validate `polygon` and test it against `line` under `model`.
///
/// A malformed ring is reported as an error rather than treated as a miss.
pub fn intersects(
    line: &RouteLine,
    polygon: &HotspotPolygon,
    model: GeometryModel,
) -> Result<bool, GeometryError> {
    let zone = Zone::try_from(polygon)?;
    Ok(line_intersects_zone(&ScoreableLine::new(line, model), &zone))
}

fn densify(route: &RouteLine, max_segment_m: f64) -> LineString<f64> {
    if !(max_segment_m.is_finite() && max_segment_m > 0.0) {
        return route.to_line_string();
    }

    let points = route.points();
    let mut coords = vec![points[0].to_coord()];
    for pair in points.windows(2) {
        let a = geo::Point::from(pair[0].to_coord());
        let b = geo::Point::from(pair[1].to_coord());
        // fill includes both ends; the start is already in `coords`
        let filled = a.haversine_intermediate_fill(&b, max_segment_m, true);
        coords.extend(filled.into_iter().skip(1).map(|p| p.0));
    }
    LineString::new(coords)
}
