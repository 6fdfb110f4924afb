//! Pick the candidate route that crosses the fewest incident hotspots.
//!
//! The entry point is [`pipeline::select`]. Everything around it (hotspot
//! loading, the routing client, rendering and the HTTP server) only feeds it
//! inputs or consumes its result.

pub mod config;
pub mod geometry;
pub mod hotspots;
pub mod model;
pub mod pipeline;
pub mod ranker;
pub mod render;
pub mod routing;
pub mod safety;
pub mod server;
pub mod time_mode;

pub use geometry::GeometryModel;
pub use model::{CandidateRoute, HotspotCollection, HotspotPolygon, Point, RouteLine, ScoredRoute};
pub use pipeline::{SelectionError, SelectionResult, select};
