//! Shortest path search over the network graph

pub mod dijkstra;
mod reachability;

pub use dijkstra::bounded_distances;
pub use reachability::ReachabilitySet;
