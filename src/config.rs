use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::geometry::GeometryModel;

#[derive(Parser, Debug)]
#[command(name = "saferoute", about = "Pick the route that crosses the fewest hotspots")]
pub struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on, overrides `bind` from the config file.
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        source: std::io::Error,
    },
    #[error("failed to parse {file}: {source}")]
    Parse {
        file: String,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub hotspots: HotspotConfig,
    pub routing: RoutingConfig,
    pub geometry: GeometryModel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            hotspots: HotspotConfig::default(),
            routing: RoutingConfig::default(),
            geometry: GeometryModel::Planar,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HotspotConfig {
    pub day: Option<PathBuf>,
    pub night: Option<PathBuf>,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self {
            day: Some(PathBuf::from("data/hotspots_day_ml.geojson")),
            night: Some(PathBuf::from("data/hotspots_night_ml.geojson")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoutingConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 10,
        }
    }
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(bind) = args.bind {
            config.bind = bind;
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            file: file.clone(),
            source,
        })?;
        Self::from_toml(&content, &file)
    }

    pub fn from_toml(content: &str, file: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            file: file.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let GeometryModel::Geodesic { max_segment_m } = self.geometry {
            if !(max_segment_m.is_finite() && max_segment_m > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "geometry.max_segment_m must be positive, got {max_segment_m}"
                )));
            }
        }
        if self.routing.timeout_secs == 0 {
            return Err(ConfigError::Invalid("routing.timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}
