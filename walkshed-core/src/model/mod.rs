//! Data model for walkshed computation
//!
//! Points of interest, road networks and the weighted graph built from them.

pub mod network;
pub mod point;

pub use network::{
    IndexedPoint, NetworkEdge, NetworkGraph, RoadNetwork, RoadSegment, Vertex, VertexKey,
};
pub use point::PointOfInterest;
