use hashbrown::HashMap;
use petgraph::graph::NodeIndex;

use crate::Distance;

/// Shortest distances from one start vertex, limited to a cutoff
#[derive(Debug, Clone)]
pub struct ReachabilitySet {
    start: NodeIndex,
    cutoff: Distance,
    distances: HashMap<NodeIndex, Distance>,
}

impl ReachabilitySet {
    pub(crate) fn new(
        start: NodeIndex,
        cutoff: Distance,
        distances: HashMap<NodeIndex, Distance>,
    ) -> Self {
        Self {
            start,
            cutoff,
            distances,
        }
    }

    pub fn start(&self) -> NodeIndex {
        self.start
    }

    pub fn cutoff(&self) -> Distance {
        self.cutoff
    }

    pub fn distance(&self, node: NodeIndex) -> Option<Distance> {
        self.distances.get(&node).copied()
    }

    pub fn contains(&self, node: NodeIndex) -> bool {
        self.distances.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn vertices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.distances.keys().copied()
    }
}
