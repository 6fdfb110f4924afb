use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};
use tracing::debug;

use crate::geometry::{self, GeometryModel, ScoreableLine, Zone};
use crate::model::{HotspotCollection, RouteLine};

type IndexedZone = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Hotspot zones of one collection, validated and indexed by bounding box.
///
/// Built once per selection and reused for every candidate route.
pub struct RiskScorer {
    model: GeometryModel,
    zones: Vec<Zone>,
    index: RTree<IndexedZone>,
}

impl RiskScorer {
    pub fn new(hotspots: Option<&HotspotCollection>, model: GeometryModel) -> Self {
        let mut zones = Vec::new();

        for (i, hotspot) in hotspots.into_iter().flat_map(|h| h.polygons.iter()).enumerate() {
            match Zone::try_from(hotspot) {
                Ok(zone) => zones.push(zone),
                // Bad upstream features are dropped, the rest still count
                Err(e) => debug!(polygon = i, error = %e, "skipping malformed hotspot"),
            }
        }

        let entries: Vec<IndexedZone> = zones
            .iter()
            .enumerate()
            .map(|(i, zone)| {
                let env = zone.envelope();
                GeomWithData::new(Rectangle::from_corners(env.min, env.max), i)
            })
            .collect();

        Self {
            model,
            zones,
            index: RTree::bulk_load(entries),
        }
    }

    /// Number of zones that survived validation.
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Count the zones `line` intersects.
    pub fn score(&self, line: &RouteLine) -> u32 {
        if self.zones.is_empty() {
            return 0;
        }

        let line = ScoreableLine::new(line, self.model);
        let env = line.envelope();
        let query = AABB::from_corners(env.min, env.max);

        let hits = self
            .index
            .locate_in_envelope_intersecting(&query)
            .filter(|entry| geometry::line_intersects_zone(&line, &self.zones[entry.data]))
            .count();

        hits as u32
    }
}

/// Risk of a single route against an optional hotspot collection.
///
/// An absent or empty collection scores 0: no data means no measured risk.
pub fn score(line: &RouteLine, hotspots: Option<&HotspotCollection>, model: GeometryModel) -> u32 {
    match hotspots {
        None => 0,
        Some(h) if h.is_empty() => 0,
        Some(_) => RiskScorer::new(hotspots, model).score(line),
    }
}
