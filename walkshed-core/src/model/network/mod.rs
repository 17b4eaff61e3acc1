//! Road network and its graph representation

pub mod components;
pub mod graph;

pub use components::{NetworkEdge, RoadNetwork, RoadSegment, Vertex, VertexKey};
pub use graph::{IndexedPoint, NetworkGraph};
