pub use crate::DEFAULT_SNAP_TOLERANCE;

// Re-export key components
pub use crate::algo::{
    ClipKind, ClippedSegment, DroppedSegment, RunReport, SkipEvent, SkipReason,
    WalkshedCollection, WalkshedOptions, WalkshedResult, compute_walkshed, run_walksheds,
};
pub use crate::export::{OutputFiles, write_outputs};
pub use crate::geometry::Crs;
pub use crate::loading::{
    NetworkAssignment, NetworkCatalog, WalkshedConfig, WalkshedInputs, load_inputs,
};
pub use crate::model::{NetworkGraph, PointOfInterest, RoadNetwork, RoadSegment};
pub use crate::routing::{ReachabilitySet, bounded_distances};

// Core types
pub use crate::Distance;
pub use crate::SegmentId;
pub use crate::{Error, TruncationError};
