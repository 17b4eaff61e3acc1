//! Walkshed algorithms built on top of the network graph

pub mod clip;
pub mod walkshed;

pub use clip::{ClipKind, ClippedSegment, DroppedSegment, EdgeClassification, clip_edges};
pub use walkshed::{
    RunReport, SkipEvent, SkipReason, WalkshedCollection, WalkshedOptions, WalkshedResult,
    assemble, compute_walkshed, run_walksheds,
};
