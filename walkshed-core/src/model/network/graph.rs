//! Undirected weighted graph of a road network

use geo::{Distance as _, Euclidean, Point};
use hashbrown::HashMap;
use log::debug;
use petgraph::graph::{NodeIndex, UnGraph};
use rstar::{PointDistance, RTree, primitives::GeomWithData};

use super::components::{NetworkEdge, RoadSegment, Vertex, VertexKey};
use crate::Distance;

/// Vertex coordinate stored in the spatial index together with its node
pub type IndexedPoint = GeomWithData<[f64; 2], NodeIndex>;

/// Road network graph with a spatial index over its vertices
#[derive(Debug, Clone)]
pub struct NetworkGraph {
    pub graph: UnGraph<Vertex, NetworkEdge>,
    rtree: RTree<IndexedPoint>,
}

impl NetworkGraph {
    /// Build a graph from (already repaired) road segments.
    ///
    /// Every pair of consecutive vertices of every segment part becomes an
    /// edge weighted by its Euclidean length. Segments without geometry and
    /// pieces that collapse onto a single vertex are skipped.
    pub fn from_segments(segments: &[RoadSegment]) -> Self {
        let mut graph = UnGraph::<Vertex, NetworkEdge>::default();
        let mut vertices: HashMap<VertexKey, NodeIndex> = HashMap::new();

        for segment in segments {
            if segment.is_empty() {
                continue;
            }

            for (part_index, part) in segment.parts().enumerate() {
                let mut offset = 0.0;

                for line in part.lines() {
                    let start = Point::from(line.start);
                    let end = Point::from(line.end);
                    let length = Euclidean.distance(start, end);

                    if VertexKey::from(line.start) != VertexKey::from(line.end) {
                        let source = vertex_for(&mut graph, &mut vertices, start);
                        let target = vertex_for(&mut graph, &mut vertices, end);
                        graph.add_edge(
                            source,
                            target,
                            NetworkEdge {
                                weight: length,
                                segment: segment.id,
                                part: part_index,
                                source_offset: offset,
                                target_offset: offset + length,
                            },
                        );
                    }
                    offset += length;
                }
            }
        }

        let indexed: Vec<IndexedPoint> = graph
            .node_indices()
            .map(|node| {
                let point = graph[node].geometry;
                IndexedPoint::new([point.x(), point.y()], node)
            })
            .collect();

        debug!(
            "Graph built with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Self {
            graph,
            rtree: RTree::bulk_load(indexed),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Vertex nearest to `point` together with its location and distance
    pub fn nearest_node(&self, point: &Point<f64>) -> Option<(NodeIndex, Point<f64>, Distance)> {
        let query = [point.x(), point.y()];
        self.rtree.nearest_neighbor(&query).map(|nearest| {
            let [x, y] = *nearest.geom();
            (
                nearest.data,
                Point::new(x, y),
                nearest.distance_2(&query).sqrt(),
            )
        })
    }

    /// Vertex whose location matches `point` after quantisation
    pub fn find_vertex(&self, point: &Point<f64>) -> Option<NodeIndex> {
        let key = VertexKey::from(point.0);
        self.nearest_node(point)
            .filter(|(_, location, _)| VertexKey::from(location.0) == key)
            .map(|(node, _, _)| node)
    }
}

fn vertex_for(
    graph: &mut UnGraph<Vertex, NetworkEdge>,
    vertices: &mut HashMap<VertexKey, NodeIndex>,
    point: Point<f64>,
) -> NodeIndex {
    *vertices
        .entry(VertexKey::from(point.0))
        .or_insert_with(|| graph.add_node(Vertex { geometry: point }))
}

#[cfg(test)]
mod tests {
    use geo::{MultiLineString, line_string};

    use super::*;

    fn segment(id: usize, coords: &[(f64, f64)]) -> RoadSegment {
        RoadSegment::from_line(id, coords.iter().copied().collect())
    }

    #[test]
    fn consecutive_vertices_become_edges() {
        let segments = vec![
            segment(0, &[(0.0, 0.0), (3.0, 4.0), (3.0, 10.0)]),
            segment(1, &[(3.0, 10.0), (10.0, 10.0)]),
        ];
        let network = NetworkGraph::from_segments(&segments);

        assert_eq!(network.vertex_count(), 4);
        assert_eq!(network.edge_count(), 3);

        for edge in network.graph.edge_weights() {
            assert!(edge.weight > 0.0);
        }
        let weights: Vec<_> = network
            .graph
            .edge_weights()
            .filter(|edge| edge.segment == 0)
            .map(|edge| (edge.weight, edge.source_offset, edge.target_offset))
            .collect();
        assert_eq!(weights, vec![(5.0, 0.0, 5.0), (6.0, 5.0, 11.0)]);
    }

    #[test]
    fn edge_weight_matches_vertex_distance() {
        let segments = vec![segment(0, &[(1.0, 1.0), (4.0, 5.0), (4.0, 9.0), (-2.0, 1.0)])];
        let network = NetworkGraph::from_segments(&segments);

        for edge in network.graph.edge_indices() {
            let (a, b) = network.graph.edge_endpoints(edge).unwrap();
            let expected = Euclidean.distance(
                network.graph[a].geometry,
                network.graph[b].geometry,
            );
            assert!((network.graph[edge].weight - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn shared_coordinates_join_segments() {
        let segments = vec![
            segment(0, &[(0.0, 0.0), (10.0, 0.0)]),
            segment(1, &[(10.0, 0.0), (10.0, 10.0)]),
            segment(2, &[(10.000_000_01, 0.0), (20.0, 0.0)]),
        ];
        let network = NetworkGraph::from_segments(&segments);

        assert_eq!(network.vertex_count(), 4);
        assert_eq!(network.edge_count(), 3);
    }

    #[test]
    fn multi_part_and_null_geometries() {
        let segments = vec![
            RoadSegment::new(
                0,
                MultiLineString::new(vec![
                    line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
                    line_string![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0)],
                ]),
            ),
            RoadSegment::new(1, MultiLineString::new(vec![])),
            segment(2, &[(7.0, 7.0), (7.0, 7.0)]),
        ];
        let network = NetworkGraph::from_segments(&segments);

        assert_eq!(network.edge_count(), 2);
        assert_eq!(network.vertex_count(), 4);
        let parts: Vec<_> = network.graph.edge_weights().map(|edge| edge.part).collect();
        assert_eq!(parts, vec![0, 1]);
    }

    #[test]
    fn empty_network_has_no_vertices() {
        let network = NetworkGraph::from_segments(&[]);
        assert!(network.is_empty());
        assert!(network.nearest_node(&Point::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn nearest_node_returns_closest_vertex() {
        let segments = vec![
            segment(0, &[(0.0, 0.0), (100.0, 0.0)]),
            segment(1, &[(100.0, 0.0), (100.0, 100.0)]),
        ];
        let network = NetworkGraph::from_segments(&segments);

        let (node, location, distance) = network.nearest_node(&Point::new(90.0, 20.0)).unwrap();
        assert_eq!(location, Point::new(100.0, 0.0));
        assert_eq!(network.graph[node].geometry, location);
        assert!((distance - (10.0_f64.powi(2) + 20.0_f64.powi(2)).sqrt()).abs() < 1e-9);

        let corner = network.find_vertex(&Point::new(100.0, 100.0)).unwrap();
        assert_eq!(network.graph[corner].geometry, Point::new(100.0, 100.0));
        assert!(network.find_vertex(&Point::new(50.0, 0.0)).is_none());
    }
}
