use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ~111_320 m per degree of latitude
#[cfg(test)]
const METERS_PER_DEGREE: f64 = 111_320.0;

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("route line needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error("point {index} is out of range: lat={lat}, lng={lng}")]
    PointOutOfRange { index: usize, lat: f64, lng: f64 },
}

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    // geo works in (x, y) = (lng, lat)
    pub(crate) fn to_coord(self) -> Coord<f64> {
        Coord { x: self.lng, y: self.lat }
    }
}

/// Ordered path of a candidate route. Always holds at least two valid points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct RouteLine {
    points: Vec<Point>,
}

impl RouteLine {
    pub fn new(points: Vec<Point>) -> Result<Self, ModelError> {
        if points.len() < 2 {
            return Err(ModelError::TooFewPoints(points.len()));
        }
        if let Some((index, p)) = points.iter().enumerate().find(|(_, p)| !p.is_valid()) {
            return Err(ModelError::PointOutOfRange {
                index,
                lat: p.lat,
                lng: p.lng,
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn to_line_string(&self) -> LineString<f64> {
        self.points.iter().map(|p| p.to_coord()).collect()
    }
}

impl TryFrom<Vec<Point>> for RouteLine {
    type Error = ModelError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<RouteLine> for Vec<Point> {
    fn from(line: RouteLine) -> Self {
        line.points
    }
}

/// One risk zone as loaded from the dataset.
///
/// The ring is stored exactly as received. Whether it is a usable closed
/// ring is decided at scoring time, so one bad feature never poisons the
/// whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotPolygon {
    pub ring: Vec<Point>,
    /// Number of incidents that fell into the cluster behind this zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    /// Half the side length of the square zone, in metres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_m: Option<f64>,
}

impl HotspotPolygon {
    pub fn from_ring(ring: Vec<Point>) -> Self {
        Self {
            ring,
            count: None,
            half_m: None,
        }
    }

    /// Axis-aligned square around `center`, `half_m` metres from centre to edge,
    /// shaped like the zones the clustering job writes.
    ///
    /// Metres are converted to degrees at the centre's latitude, so the square
    /// is only approximately square on the ground away from the equator.
    #[cfg(test)]
    pub(crate) fn square(center: Point, half_m: f64) -> Self {
        let dlat = half_m / METERS_PER_DEGREE;
        let dlng = half_m / (METERS_PER_DEGREE * center.lat.to_radians().cos());

        let ring = vec![
            Point::new(center.lat - dlat, center.lng - dlng),
            Point::new(center.lat - dlat, center.lng + dlng),
            Point::new(center.lat + dlat, center.lng + dlng),
            Point::new(center.lat + dlat, center.lng - dlng),
            Point::new(center.lat - dlat, center.lng - dlng),
        ];

        Self {
            ring,
            count: None,
            half_m: Some(half_m),
        }
    }
}

/// All hotspot zones for one time mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotspotCollection {
    pub polygons: Vec<HotspotPolygon>,
}

impl HotspotCollection {
    pub fn new(polygons: Vec<HotspotPolygon>) -> Self {
        Self { polygons }
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

/// A route as proposed by the routing service. Distance and duration are passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRoute {
    pub line: RouteLine,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRoute {
    pub route: CandidateRoute,
    /// Number of hotspot zones the route crosses.
    pub risk: u32,
}
