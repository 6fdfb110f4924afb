//! Day/night hotspot datasets.
//!
//! Each dataset is a GeoJSON `FeatureCollection` of `Polygon` features, as
//! written by the offline clustering job. A dataset that is not configured or
//! whose file does not exist is *absent*, which is kept distinct from a file
//! that exists but holds no features.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use geojson::{Feature, GeoJson, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{HotspotCollection, HotspotPolygon, Point};
use crate::time_mode::TimeMode;

#[derive(Error, Debug)]
pub enum HotspotError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("expected a FeatureCollection")]
    NotFeatureCollection,
}

#[derive(Debug, Clone, Default)]
pub struct HotspotStore {
    day: Option<HotspotCollection>,
    night: Option<HotspotCollection>,
}

impl HotspotStore {
    pub fn new(day: Option<HotspotCollection>, night: Option<HotspotCollection>) -> Self {
        Self { day, night }
    }

    pub fn load(day: Option<&Path>, night: Option<&Path>) -> Result<Self, HotspotError> {
        Ok(Self {
            day: load_optional(day, TimeMode::Day)?,
            night: load_optional(night, TimeMode::Night)?,
        })
    }

    pub fn collection(&self, mode: TimeMode) -> Option<&HotspotCollection> {
        match mode {
            TimeMode::Day => self.day.as_ref(),
            TimeMode::Night => self.night.as_ref(),
        }
    }
}

fn load_optional(
    path: Option<&Path>,
    mode: TimeMode,
) -> Result<Option<HotspotCollection>, HotspotError> {
    let Some(path) = path else {
        warn!(?mode, "no hotspot dataset configured");
        return Ok(None);
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(?mode, path = %path.display(), "hotspot dataset not found");
            return Ok(None);
        }
        Err(source) => {
            return Err(HotspotError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let collection = parse_collection(&content)?;
    info!(?mode, path = %path.display(), polygons = collection.len(), "loaded hotspots");
    Ok(Some(collection))
}

/// Parse a GeoJSON `FeatureCollection` into hotspot polygons.
///
/// Each exterior ring becomes one hotspot (a `MultiPolygon` contributes one
/// per part). Features without polygon geometry are skipped. Rings are not
/// validated here.
pub fn parse_collection(content: &str) -> Result<HotspotCollection, HotspotError> {
    let GeoJson::FeatureCollection(fc) = content.parse::<GeoJson>()? else {
        return Err(HotspotError::NotFeatureCollection);
    };

    let mut polygons = Vec::new();
    for (i, feature) in fc.features.iter().enumerate() {
        let rings: Vec<&Vec<Vec<f64>>> = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Polygon(rings)) => rings.first().into_iter().collect(),
            Some(Value::MultiPolygon(parts)) => parts.iter().filter_map(|p| p.first()).collect(),
            _ => {
                warn!(feature = i, "skipping feature without polygon geometry");
                continue;
            }
        };

        for ring in rings {
            let Some(ring) = to_ring(ring) else {
                warn!(feature = i, "skipping ring with short positions");
                continue;
            };
            polygons.push(HotspotPolygon {
                ring,
                count: feature_u64(feature, "count"),
                half_m: feature_f64(feature, "half_m"),
            });
        }
    }

    Ok(HotspotCollection::new(polygons))
}

// GeoJSON positions are [lng, lat, ...]
fn to_ring(positions: &[Vec<f64>]) -> Option<Vec<Point>> {
    positions
        .iter()
        .map(|pos| match pos.as_slice() {
            [lng, lat, ..] => Some(Point::new(*lat, *lng)),
            _ => None,
        })
        .collect()
}

fn feature_u64(feature: &Feature, key: &str) -> Option<u64> {
    feature.property(key).and_then(|v| v.as_u64())
}

fn feature_f64(feature: &Feature, key: &str) -> Option<f64> {
    feature.property(key).and_then(|v| v.as_f64())
}
