use std::collections::BinaryHeap;

use hashbrown::HashMap;
use petgraph::{graph::NodeIndex, visit::EdgeRef};

use super::state::State;
use crate::{Distance, model::NetworkGraph, routing::ReachabilitySet};

/// Dijkstra's algorithm bounded by a maximum path length.
///
/// Returns the shortest distance from `start` to every vertex whose distance
/// does not exceed `cutoff`. Vertices past the cutoff are never pushed onto
/// the frontier, so the search stops at the boundary instead of exploring
/// the whole graph.
pub fn bounded_distances(
    graph: &NetworkGraph,
    start: NodeIndex,
    cutoff: Distance,
) -> ReachabilitySet {
    let estimated_nodes = graph.vertex_count().min(1000);
    let mut distances: HashMap<NodeIndex, Distance> = HashMap::with_capacity(estimated_nodes);
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);

    // Start node has distance 0
    heap.push(State {
        cost: 0.0,
        node: start,
    });
    distances.insert(start, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        // Skip if we've found a better path
        if let Some(&best) = distances.get(&node)
            && cost > best
        {
            continue;
        }

        // Examine neighbors
        for edge in graph.graph.edges(node) {
            let next = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            let next_cost = cost + edge.weight().weight;

            if next_cost > cutoff {
                continue;
            }

            // Add or update distance if better using Entry API
            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    ReachabilitySet::new(start, cutoff, distances)
}
