//! Pedestrian walkshed engine.
//!
//! Repairs a road network, turns it into a weighted graph, finds everything
//! reachable from a point of interest within a walking distance and clips
//! the road geometry that is only partially within reach.

pub mod algo;
pub mod error;
pub mod export;
pub mod geometry;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::{Error, TruncationError};
pub use loading::{WalkshedConfig, load_inputs};
pub use model::{NetworkGraph, PointOfInterest, RoadNetwork, RoadSegment};

/// Positional index of a segment within its source network
pub type SegmentId = usize;

/// Length along the network, in units of the working reference frame
pub type Distance = f64;

/// Default snapping tolerance used to close digitisation gaps
pub const DEFAULT_SNAP_TOLERANCE: Distance = 1.0;
