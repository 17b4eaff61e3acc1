mod bounded_dijkstra;
mod state;

pub use bounded_dijkstra::bounded_distances;
