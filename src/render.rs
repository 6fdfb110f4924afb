//! Hand a selection to a caller-owned render target.
//!
//! Nothing here holds global map state: the caller creates a target, passes
//! it to [`render`], and owns whatever it accumulated afterwards.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

use crate::model::{HotspotCollection, HotspotPolygon, Point, ScoredRoute};
use crate::pipeline::SelectionResult;

pub trait RenderTarget {
    /// Drop anything drawn by a previous selection.
    fn clear(&mut self);
    fn draw_hotspot(&mut self, hotspot: &HotspotPolygon);
    fn draw_route(&mut self, route: &ScoredRoute, rank: usize, selected: bool);
}

/// Draw hotspots, then alternatives, then the winner on top.
pub fn render<T: RenderTarget>(
    result: &SelectionResult,
    hotspots: Option<&HotspotCollection>,
    target: &mut T,
) {
    target.clear();

    for hotspot in hotspots.into_iter().flat_map(|h| h.polygons.iter()) {
        target.draw_hotspot(hotspot);
    }

    for (rank, route) in result.all_scored.iter().enumerate().skip(1) {
        target.draw_route(route, rank, false);
    }
    target.draw_route(&result.winner, 0, true);
}

/// Accumulates GeoJSON layers for a web map.
#[derive(Debug, Default)]
pub struct GeoJsonLayers {
    hotspots: Vec<Feature>,
    routes: Vec<Feature>,
}

impl GeoJsonLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hotspots first so map clients paint routes above them.
    pub fn into_feature_collection(self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.hotspots.into_iter().chain(self.routes).collect(),
            foreign_members: None,
        }
    }
}

impl RenderTarget for GeoJsonLayers {
    fn clear(&mut self) {
        self.hotspots.clear();
        self.routes.clear();
    }

    fn draw_hotspot(&mut self, hotspot: &HotspotPolygon) {
        let mut props = JsonObject::new();
        props.insert("layer".into(), "hotspot".into());
        if let Some(count) = hotspot.count {
            props.insert("count".into(), count.into());
        }
        if let Some(half_m) = hotspot.half_m {
            props.insert("half_m".into(), half_m.into());
        }

        let ring = positions(&hotspot.ring);
        self.hotspots.push(feature(Value::Polygon(vec![ring]), props));
    }

    fn draw_route(&mut self, route: &ScoredRoute, rank: usize, selected: bool) {
        let mut props = JsonObject::new();
        props.insert("layer".into(), "route".into());
        props.insert("selected".into(), JsonValue::Bool(selected));
        props.insert("rank".into(), rank.into());
        props.insert("risk".into(), route.risk.into());
        props.insert("distance_meters".into(), route.route.distance_meters.into());
        props.insert("duration_seconds".into(), route.route.duration_seconds.into());

        let line = positions(route.route.line.points());
        self.routes.push(feature(Value::LineString(line), props));
    }
}

fn positions(points: &[Point]) -> Vec<Vec<f64>> {
    points.iter().map(|p| vec![p.lng, p.lat]).collect()
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
